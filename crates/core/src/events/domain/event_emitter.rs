use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::event::{Event, EventCooldowns, EventKind};
use super::event_sink::EventSink;
use crate::shared::constants::{
    DEFAULT_ENTRY_COOLDOWN_SECS, DEFAULT_PHONE_COOLDOWN_SECS, DEFAULT_SUBJECT_DEDUP_WINDOW_SECS,
    DEFAULT_UNAUTHORIZED_COOLDOWN_SECS,
};
use crate::shared::ids::CameraId;
use crate::tracking::domain::track::Track;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    #[serde(with = "crate::shared::duration_secs")]
    pub entry: Duration,
    #[serde(with = "crate::shared::duration_secs")]
    pub exit: Duration,
    #[serde(with = "crate::shared::duration_secs")]
    pub unauthorized: Duration,
    #[serde(with = "crate::shared::duration_secs")]
    pub phone_detected: Duration,
    /// Entry/exit for the same subject on the same camera within this window
    /// are suppressed even when they come from different tracks.
    #[serde(with = "crate::shared::duration_secs")]
    pub subject_dedup_window: Duration,
}

impl CooldownConfig {
    pub fn for_kind(&self, kind: EventKind) -> Duration {
        match kind {
            EventKind::Entry => self.entry,
            EventKind::Exit => self.exit,
            EventKind::Unauthorized => self.unauthorized,
            EventKind::PhoneDetected => self.phone_detected,
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            entry: Duration::from_secs(DEFAULT_ENTRY_COOLDOWN_SECS),
            exit: Duration::ZERO,
            unauthorized: Duration::from_secs(DEFAULT_UNAUTHORIZED_COOLDOWN_SECS),
            phone_detected: Duration::from_secs(DEFAULT_PHONE_COOLDOWN_SECS),
            subject_dedup_window: Duration::from_secs(DEFAULT_SUBJECT_DEDUP_WINDOW_SECS),
        }
    }
}

/// Dedup key for subject-scoped events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubjectKey {
    pub subject: String,
    pub camera_id: CameraId,
}

/// Single point of rate limiting between decisions and the event sink.
///
/// Every event passes the per-track cooldown for its kind. Entry events for
/// a named subject additionally pass a per-(subject, camera) window, which
/// absorbs tracker id churn on the same person. An exit is only announced
/// for a track whose own entry was announced, so entries and exits pair up.
pub struct EventEmitter {
    camera_id: CameraId,
    config: CooldownConfig,
    sink: Box<dyn EventSink>,
    subject_last: HashMap<SubjectKey, EventCooldowns>,
    emitted: usize,
    suppressed: usize,
}

impl EventEmitter {
    pub fn new(camera_id: CameraId, config: CooldownConfig, sink: Box<dyn EventSink>) -> Self {
        Self {
            camera_id,
            config,
            sink,
            subject_last: HashMap::new(),
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Returns whether the event passed the cooldowns. A sink failure is
    /// logged and still counts as emitted for rate limiting.
    pub fn emit(&mut self, track: &mut Track, kind: EventKind, now: Duration) -> bool {
        if track.cooldowns.is_cooling(kind, now, self.config.for_kind(kind)) {
            log::debug!("Suppressed {kind} for track {}: cooldown", track.id());
            self.suppressed += 1;
            return false;
        }

        if kind == EventKind::Exit && track.cooldowns.last(EventKind::Entry).is_none() {
            log::debug!("Suppressed {kind} for track {}: entry never announced", track.id());
            self.suppressed += 1;
            return false;
        }

        let subject = track.status().subject().map(str::to_string);
        let subject_key = match (&subject, kind) {
            (Some(name), EventKind::Entry) => Some(SubjectKey {
                subject: name.clone(),
                camera_id: self.camera_id.clone(),
            }),
            _ => None,
        };
        if let Some(key) = &subject_key {
            let window = self.config.subject_dedup_window;
            if self
                .subject_last
                .get(key)
                .is_some_and(|c| c.is_cooling(kind, now, window))
            {
                log::debug!(
                    "Suppressed {kind} for {} on {}: seen within dedup window",
                    key.subject,
                    key.camera_id
                );
                self.suppressed += 1;
                return false;
            }
        }

        track.cooldowns.record(kind, now);
        if let Some(key) = subject_key {
            self.subject_last.entry(key).or_default().record(kind, now);
        }

        let confidence = if kind.is_subject_scoped() {
            track.identity().resolved.as_ref().map(|m| m.similarity)
        } else {
            None
        };
        let event = Event {
            kind,
            camera_id: self.camera_id.clone(),
            track_id: track.id(),
            subject,
            confidence,
            timestamp: now,
        };

        self.emitted += 1;
        log::info!(
            "[{}] {kind} track={} subject={}",
            self.camera_id,
            event.track_id,
            event.subject.as_deref().unwrap_or("-")
        );
        if let Err(e) = self.sink.publish(&event) {
            log::warn!("Failed to publish {kind} event: {e}");
        }
        true
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            log::warn!("Failed to flush event sink: {e}");
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}
