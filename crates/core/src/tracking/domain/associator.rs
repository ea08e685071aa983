use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::assigner::{iou_matrix, Assigner, Assignment};
use super::track::Track;
use super::track_store::TrackStore;
use crate::shared::bbox::{BBox, Detection};
use crate::shared::constants::{
    DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_AGE, DEFAULT_MIN_HITS, DEFAULT_MIN_PERSON_CONFIDENCE,
    DEFAULT_MIN_PHONE_CONFIDENCE,
};
use crate::shared::ids::TrackId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStrategy {
    #[default]
    Greedy,
    Hungarian,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub iou_threshold: f64,
    pub min_hits: u32,
    pub max_age: u32,
    pub min_person_confidence: f64,
    pub min_phone_confidence: f64,
    pub assignment: AssignmentStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_hits: DEFAULT_MIN_HITS,
            max_age: DEFAULT_MAX_AGE,
            min_person_confidence: DEFAULT_MIN_PERSON_CONFIDENCE,
            min_phone_confidence: DEFAULT_MIN_PHONE_CONFIDENCE,
            assignment: AssignmentStrategy::default(),
        }
    }
}

/// Tracks the association cycle produced for one frame.
#[derive(Debug, Default)]
pub struct AssociationOutcome {
    /// Every surviving track with `hits >= min_hits`, including tracks
    /// coasting through a missed frame.
    pub confirmed: BTreeMap<TrackId, BBox>,
    /// Tracks removed this cycle because their age exceeded `max_age`.
    pub expired: Vec<Track>,
}

/// Matches per-frame detections to tracks and owns track birth and death.
pub struct Associator {
    assigner: Box<dyn Assigner>,
    iou_threshold: f64,
    min_hits: u32,
    max_age: u32,
}

impl Associator {
    pub fn new(assigner: Box<dyn Assigner>, config: &TrackerConfig) -> Self {
        Self {
            assigner,
            iou_threshold: config.iou_threshold,
            min_hits: config.min_hits,
            max_age: config.max_age,
        }
    }

    pub fn update(
        &mut self,
        store: &mut TrackStore,
        detections: &[Detection],
        now: Duration,
    ) -> AssociationOutcome {
        if detections.is_empty() {
            store.iter_mut().for_each(Track::mark_missed);
        } else if store.is_empty() {
            for detection in detections {
                store.spawn(detection, now);
            }
        } else {
            self.associate(store, detections, now);
        }

        let expired = store.purge_expired(self.max_age);
        for track in &expired {
            log::debug!("Track {} expired after {} missed frames", track.id(), track.age());
        }

        let confirmed = store
            .iter()
            .filter(|t| t.hits() >= self.min_hits)
            .map(|t| (t.id(), *t.bbox()))
            .collect();

        AssociationOutcome { confirmed, expired }
    }

    fn associate(&self, store: &mut TrackStore, detections: &[Detection], now: Duration) {
        let track_ids = store.ids();
        let track_boxes: Vec<BBox> = store.iter().map(|t| *t.bbox()).collect();
        let det_boxes: Vec<BBox> = detections.iter().map(|d| d.bbox).collect();

        let iou = iou_matrix(&det_boxes, &track_boxes);
        let Assignment {
            matches,
            unmatched_detections,
            unmatched_tracks,
        } = self.assigner.assign(iou.view(), &det_boxes, self.iou_threshold);

        for (d, t) in matches {
            if let Some(track) = store.get_mut(track_ids[t]) {
                track.mark_matched(det_boxes[d], now);
            }
        }
        for t in unmatched_tracks {
            if let Some(track) = store.get_mut(track_ids[t]) {
                track.mark_missed();
            }
        }
        for d in unmatched_detections {
            let id = store.spawn(&detections[d], now);
            log::debug!("New track {id}");
        }
    }
}
