use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::registry_cache::RegistryCache;
use super::registry_snapshot::{RegistrySnapshot, SubjectMatch};
use crate::detection::domain::detection_adapter::DetectionAdapter;
use crate::shared::constants::{
    DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_FACE_SAMPLE_INTERVAL, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_REGISTRY_TTL_SECS,
};
use crate::shared::frame::Frame;
use crate::tracking::domain::track::{IdentityMatch, IdentityStatus, Track};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Attempt face matching on every Nth confirmed, visible frame of a track.
    pub face_sample_interval: u32,
    pub match_threshold: f64,
    pub duplicate_threshold: f64,
    #[serde(with = "crate::shared::duration_secs")]
    pub registry_ttl: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            face_sample_interval: DEFAULT_FACE_SAMPLE_INTERVAL,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            registry_ttl: Duration::from_secs(DEFAULT_REGISTRY_TTL_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResolveOutcome {
    /// Not attempted: off-cadence, not identifying, already resolved, or
    /// resolution disabled.
    Skipped,
    NoFace,
    /// A face was found but nothing in the registry cleared the threshold.
    Unmatched { best: Option<SubjectMatch> },
    Matched(IdentityMatch),
}

/// Incrementally resolves who a track is, sampling faces on a cadence
/// instead of every frame.
pub struct IdentityResolver {
    cache: Option<Arc<RegistryCache>>,
    snapshot: Arc<RegistrySnapshot>,
    sample_interval: u64,
    match_threshold: f64,
}

impl IdentityResolver {
    /// Loads the initial snapshot. If the registry is unreachable,
    /// resolution is disabled for this resolver and tracks can only become
    /// Unknown.
    pub fn new(cache: Option<Arc<RegistryCache>>, config: &IdentityConfig) -> Self {
        let cache = cache.and_then(|cache| match cache.snapshot() {
            Ok(_) => Some(cache),
            Err(e) => {
                log::error!("Registry unavailable, identity resolution disabled: {e}");
                None
            }
        });
        let snapshot = cache
            .as_ref()
            .and_then(|c| c.snapshot().ok())
            .unwrap_or_default();
        Self {
            cache,
            snapshot,
            sample_interval: config.face_sample_interval.max(1) as u64,
            match_threshold: config.match_threshold,
        }
    }

    pub fn disabled(config: &IdentityConfig) -> Self {
        Self::new(None, config)
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Picks up the cache's current snapshot; called once per frame.
    pub fn refresh(&mut self) {
        if let Some(cache) = &self.cache {
            match cache.snapshot() {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => log::warn!("Registry refresh failed, keeping previous snapshot: {e}"),
            }
        }
    }

    pub fn snapshot(&self) -> &RegistrySnapshot {
        &self.snapshot
    }

    /// Runs one resolution step for a confirmed track on this frame.
    ///
    /// The first confirmed, visible frame is always sampled. Embedding
    /// errors count as no face.
    pub fn resolve(
        &self,
        track: &mut Track,
        frame: &Frame,
        adapter: &mut dyn DetectionAdapter,
    ) -> ResolveOutcome {
        if !self.is_enabled()
            || track.status() != &IdentityStatus::Identifying
            || track.identity.resolved.is_some()
            || !track.is_visible()
        {
            return ResolveOutcome::Skipped;
        }

        let slot = track.identity.frames_considered;
        track.identity.frames_considered += 1;
        if slot % self.sample_interval != 0 {
            return ResolveOutcome::Skipped;
        }

        track.identity.face_attempts += 1;
        let embedding = match adapter.embed(frame, track.bbox()) {
            Ok(embedding) => embedding,
            Err(e) => {
                log::warn!("Embedding failed for track {}: {e}", track.id());
                None
            }
        };
        let Some(embedding) = embedding else {
            track.identity.no_face_count += 1;
            return ResolveOutcome::NoFace;
        };

        track.identity.face_detected_count += 1;
        match self.snapshot.best_match(&embedding) {
            Some(best) if best.similarity > self.match_threshold => {
                log::info!(
                    "Track {} identified as {} (similarity {:.3})",
                    track.id(),
                    best.name,
                    best.similarity
                );
                let resolved = IdentityMatch {
                    subject_id: best.subject_id,
                    name: best.name,
                    similarity: best.similarity,
                };
                track.identity.resolved = Some(resolved.clone());
                ResolveOutcome::Matched(resolved)
            }
            best => {
                log::debug!(
                    "Track {} face unmatched (best {:?})",
                    track.id(),
                    best.as_ref().map(|m| m.similarity)
                );
                ResolveOutcome::Unmatched { best }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_adapter::FrameDetections;
    use crate::identity::domain::embedding::Embedding;
    use crate::shared::bbox::{BBox, Detection};
    use crate::shared::ids::TrackId;
    use crate::testing::{frame_at, InMemoryRegistryStore, StubAdapter};

    fn config(interval: u32) -> IdentityConfig {
        IdentityConfig {
            face_sample_interval: interval,
            ..IdentityConfig::default()
        }
    }

    fn cache_with_alice() -> Arc<RegistryCache> {
        let store = Arc::new(InMemoryRegistryStore::new());
        store.insert("Alice", vec![Embedding::new(vec![1.0, 0.0])]);
        Arc::new(RegistryCache::new(store, Duration::from_secs(300), 0.7))
    }

    fn track() -> Track {
        let detection = Detection::person(BBox::new(0.0, 0.0, 10.0, 10.0), 0.9);
        Track::spawn(TrackId(1), &detection, Duration::ZERO)
    }

    fn adapter(embedding: Option<Vec<f32>>) -> StubAdapter {
        StubAdapter::constant(FrameDetections::default())
            .with_embeddings(move |_, _| embedding.clone().map(Embedding::new))
    }

    #[test]
    fn test_samples_first_frame_then_every_nth() {
        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config(10));
        let mut adapter = adapter(None);
        let calls = adapter.embed_calls();
        let mut t = track();

        for i in 0..25 {
            resolver.resolve(&mut t, &frame_at(i), &mut adapter);
        }

        assert_eq!(*calls.lock().unwrap(), vec![0, 10, 20]);
        assert_eq!(t.identity().face_attempts, 3);
        assert_eq!(t.identity().no_face_count, 3);
        assert_eq!(t.identity().face_detected_count, 0);
    }

    #[test]
    fn test_match_above_threshold_resolves() {
        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config(1));
        let mut adapter = adapter(Some(vec![0.92, 0.3919]));
        let mut t = track();

        let outcome = resolver.resolve(&mut t, &frame_at(0), &mut adapter);

        match outcome {
            ResolveOutcome::Matched(m) => {
                assert_eq!(m.name, "Alice");
                assert!((m.similarity - 0.92).abs() < 1e-3);
            }
            other => panic!("expected match, got {other:?}"),
        }
        assert_eq!(t.identity().face_detected_count, 1);
    }

    #[test]
    fn test_match_threshold_is_exclusive() {
        let config = IdentityConfig {
            match_threshold: 1.0,
            ..config(1)
        };
        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config);
        let mut adapter = adapter(Some(vec![1.0, 0.0]));
        let mut t = track();

        let outcome = resolver.resolve(&mut t, &frame_at(0), &mut adapter);

        assert!(matches!(outcome, ResolveOutcome::Unmatched { best: Some(_) }));
        assert!(t.identity().resolved.is_none());
    }

    #[test]
    fn test_resolved_track_is_not_re_evaluated() {
        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config(1));
        let mut adapter = adapter(Some(vec![1.0, 0.0]));
        let calls = adapter.embed_calls();
        let mut t = track();

        resolver.resolve(&mut t, &frame_at(0), &mut adapter);
        let second = resolver.resolve(&mut t, &frame_at(1), &mut adapter);

        assert_eq!(second, ResolveOutcome::Skipped);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_invisible_track_is_skipped_without_advancing_cadence() {
        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config(10));
        let mut adapter = adapter(None);
        let mut t = track();
        t.mark_missed();

        assert_eq!(
            resolver.resolve(&mut t, &frame_at(0), &mut adapter),
            ResolveOutcome::Skipped
        );
        assert_eq!(t.identity().frames_considered, 0);
    }

    #[test]
    fn test_disabled_resolver_never_embeds() {
        let resolver = IdentityResolver::disabled(&config(1));
        let mut adapter = adapter(Some(vec![1.0, 0.0]));
        let calls = adapter.embed_calls();
        let mut t = track();

        for i in 0..5 {
            resolver.resolve(&mut t, &frame_at(i), &mut adapter);
        }

        assert!(!resolver.is_enabled());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unreachable_registry_disables_resolution() {
        let store = Arc::new(InMemoryRegistryStore::new());
        store.set_failing(true);
        let cache = Arc::new(RegistryCache::new(store, Duration::from_secs(300), 0.7));

        let resolver = IdentityResolver::new(Some(cache), &config(1));

        assert!(!resolver.is_enabled());
    }

    #[test]
    fn test_embedding_error_counts_as_no_face() {
        use crate::detection::domain::detection_adapter::DetectionError;

        struct Broken;
        impl DetectionAdapter for Broken {
            fn detect(&mut self, _: &Frame) -> Result<FrameDetections, DetectionError> {
                Ok(FrameDetections::default())
            }
            fn embed(&mut self, _: &Frame, _: &BBox) -> Result<Option<Embedding>, DetectionError> {
                Err(DetectionError::Unavailable("model crashed".into()))
            }
        }

        let resolver = IdentityResolver::new(Some(cache_with_alice()), &config(1));
        let mut t = track();

        let outcome = resolver.resolve(&mut t, &frame_at(0), &mut Broken);

        assert_eq!(outcome, ResolveOutcome::NoFace);
        assert_eq!(t.identity().no_face_count, 1);
    }

    #[test]
    fn test_refresh_picks_up_registrations() {
        let cache = cache_with_alice();
        let mut resolver = IdentityResolver::new(Some(cache.clone()), &config(1));
        cache
            .register("Bob", &Embedding::new(vec![0.0, 1.0]), None)
            .unwrap();

        resolver.refresh();

        assert_eq!(resolver.snapshot().subject_count(), 2);
    }
}
