use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::config::GatekeeperConfig;
use super::pipeline_logger::PipelineLogger;
use crate::decision::domain::decision_machine::DecisionMachine;
use crate::detection::domain::detection_adapter::{DetectionAdapter, FrameDetections};
use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::event_sink::EventSink;
use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::identity::domain::registry_cache::RegistryCache;
use crate::shared::bbox::BBox;
use crate::shared::frame::Frame;
use crate::shared::ids::{CameraId, TrackId};
use crate::tracking::domain::associator::Associator;
use crate::tracking::domain::track::Track;
use crate::tracking::domain::track_store::TrackStore;
use crate::tracking::infrastructure::assigner_factory::create_assigner;

/// What one frame produced.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub confirmed: BTreeMap<TrackId, BBox>,
    pub events_emitted: usize,
    pub expired: Vec<TrackId>,
}

/// Sequential per-camera pipeline:
/// `detect → associate → resolve identity → decide → emit`.
///
/// Owns its track store; the registry cache is the only state shared with
/// other cameras.
pub struct CameraPipeline {
    camera_id: CameraId,
    adapter: Box<dyn DetectionAdapter>,
    store: TrackStore,
    associator: Associator,
    resolver: IdentityResolver,
    decisions: DecisionMachine,
    emitter: EventEmitter,
    logger: Box<dyn PipelineLogger>,
    min_person_confidence: f64,
    min_phone_confidence: f64,
    frames_processed: usize,
}

impl CameraPipeline {
    pub fn new(
        camera_id: CameraId,
        config: &GatekeeperConfig,
        adapter: Box<dyn DetectionAdapter>,
        registry: Option<Arc<RegistryCache>>,
        sink: Box<dyn EventSink>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let associator = Associator::new(create_assigner(config.tracker.assignment), &config.tracker);
        let resolver = IdentityResolver::new(registry, &config.identity);
        if !resolver.is_enabled() {
            log::warn!("[{camera_id}] running without identity resolution");
        }
        Self {
            emitter: EventEmitter::new(camera_id.clone(), config.cooldowns.clone(), sink),
            camera_id,
            adapter,
            store: TrackStore::new(),
            associator,
            resolver,
            decisions: DecisionMachine::new(config.decision.clone()),
            logger,
            min_person_confidence: config.tracker.min_person_confidence,
            min_phone_confidence: config.tracker.min_phone_confidence,
            frames_processed: 0,
        }
    }

    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        let now = frame.timestamp();
        let emitted_before = self.emitter.emitted();

        let t0 = Instant::now();
        let detections = match self.adapter.detect(frame) {
            Ok(detections) => {
                detections.sanitized(self.min_person_confidence, self.min_phone_confidence)
            }
            Err(e) => {
                log::warn!("[{}] detection failed on frame {}: {e}", self.camera_id, frame.index());
                FrameDetections::default()
            }
        };
        self.logger.timing("detect", ms_since(t0));

        let t0 = Instant::now();
        let outcome = self.associator.update(&mut self.store, &detections.persons, now);
        self.logger.timing("associate", ms_since(t0));

        let t0 = Instant::now();
        self.resolver.refresh();
        for id in outcome.confirmed.keys() {
            if let Some(track) = self.store.get_mut(*id) {
                self.resolver.resolve(track, frame, self.adapter.as_mut());
            }
        }
        self.logger.timing("resolve", ms_since(t0));

        let t0 = Instant::now();
        for id in outcome.confirmed.keys() {
            if let Some(track) = self.store.get_mut(*id) {
                self.decisions.evaluate(track, now, &mut self.emitter);
                self.decisions
                    .check_phone(track, &detections.phones, now, &mut self.emitter);
            }
        }
        let mut expired = Vec::with_capacity(outcome.expired.len());
        for mut track in outcome.expired {
            self.decisions.on_exit(&mut track, now, &mut self.emitter);
            expired.push(track.id());
        }
        self.logger.timing("decide", ms_since(t0));

        let events_emitted = self.emitter.emitted() - emitted_before;
        self.frames_processed += 1;
        self.logger.metric("confirmed_tracks", outcome.confirmed.len() as f64);
        self.logger.metric("events", events_emitted as f64);
        self.logger.progress(self.frames_processed);

        FrameReport {
            confirmed: outcome.confirmed,
            events_emitted,
            expired,
        }
    }

    /// Flushes the sink and logs the summary. Tracks still in view do not
    /// produce exit events.
    pub fn finish(&mut self) {
        self.emitter.flush();
        self.logger.info(&format!(
            "stopped after {} frames: {} events emitted, {} suppressed",
            self.frames_processed,
            self.emitter.emitted(),
            self.emitter.suppressed()
        ));
        self.logger.summary();
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.store.get(id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.store.iter()
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    pub fn events_emitted(&self) -> usize {
        self.emitter.emitted()
    }
}

fn ms_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
