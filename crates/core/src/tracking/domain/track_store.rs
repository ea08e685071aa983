use std::collections::BTreeMap;
use std::time::Duration;

use super::track::Track;
use crate::shared::bbox::Detection;
use crate::shared::ids::TrackId;

/// Authoritative id → track map for one camera.
///
/// Ids start at 1 and are never reused, even after the track is purged.
/// Iteration is in id order, which keeps per-frame processing deterministic.
#[derive(Debug)]
pub struct TrackStore {
    tracks: BTreeMap<TrackId, Track>,
    next_id: u64,
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, detection: &Detection, now: Duration) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.tracks.insert(id, Track::spawn(id, detection, now));
        id
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Removes and returns every track with `age > max_age`, in id order.
    pub fn purge_expired(&mut self, max_age: u32) -> Vec<Track> {
        let expired: Vec<TrackId> = self
            .tracks
            .values()
            .filter(|t| t.age() > max_age)
            .map(|t| t.id())
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.tracks.remove(&id))
            .collect()
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}
