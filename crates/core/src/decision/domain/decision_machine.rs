use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::phone_monitor::phone_in_box;
use crate::events::domain::event::EventKind;
use crate::events::domain::event_emitter::EventEmitter;
use crate::shared::bbox::Detection;
use crate::shared::constants::{
    DEFAULT_GRACE_WITHOUT_FACE_SECS, DEFAULT_GRACE_WITH_FACE_SECS, DEFAULT_MIN_FACE_ATTEMPTS,
};
use crate::tracking::domain::track::{IdentityStatus, Track};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Faces that must have been seen, without a match, before a track can
    /// be declared Unknown under the shorter grace period. Tracks with fewer
    /// faces fall back to the longer one.
    pub min_face_attempts: u32,
    #[serde(with = "crate::shared::duration_secs")]
    pub grace_period_with_face: Duration,
    #[serde(with = "crate::shared::duration_secs")]
    pub grace_period_without_face: Duration,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_face_attempts: DEFAULT_MIN_FACE_ATTEMPTS,
            grace_period_with_face: Duration::from_secs(DEFAULT_GRACE_WITH_FACE_SECS),
            grace_period_without_face: Duration::from_secs(DEFAULT_GRACE_WITHOUT_FACE_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Remain,
    Authorize(String),
    Reject,
}

/// A status transition made this frame and whether its event got through
/// the emitter.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub status: IdentityStatus,
    pub announced: bool,
}

/// Identifying → Authorized(name) | Unknown, with grace periods measured
/// from the track's first sighting.
pub struct DecisionMachine {
    config: DecisionConfig,
}

impl DecisionMachine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// What the track's status should become, without side effects.
    pub fn decide(&self, track: &Track, now: Duration) -> Decision {
        if track.status().is_terminal() {
            return Decision::Remain;
        }
        let evidence = track.identity();
        if let Some(resolved) = &evidence.resolved {
            return Decision::Authorize(resolved.name.clone());
        }

        let elapsed = now.saturating_sub(track.first_seen());
        let faces = evidence.face_detected_count;
        if faces >= self.config.min_face_attempts && elapsed >= self.config.grace_period_with_face {
            return Decision::Reject;
        }
        if faces < self.config.min_face_attempts && elapsed >= self.config.grace_period_without_face {
            return Decision::Reject;
        }
        Decision::Remain
    }

    /// Applies `decide` and emits `entry` or `unauthorized` on a transition.
    pub fn evaluate(
        &self,
        track: &mut Track,
        now: Duration,
        emitter: &mut EventEmitter,
    ) -> Option<Verdict> {
        let (status, kind) = match self.decide(track, now) {
            Decision::Remain => return None,
            Decision::Authorize(name) => (IdentityStatus::Authorized(name), EventKind::Entry),
            Decision::Reject => (IdentityStatus::Unknown, EventKind::Unauthorized),
        };

        log::info!(
            "Track {} is {status} after {:.1}s ({} faces, {} attempts)",
            track.id(),
            now.saturating_sub(track.first_seen()).as_secs_f64(),
            track.identity().face_detected_count,
            track.identity().face_attempts
        );
        track.status = status.clone();
        let announced = emitter.emit(track, kind, now);
        Some(Verdict { status, announced })
    }

    /// Emits `phone_detected` for a visible track holding a phone, whatever
    /// its status.
    pub fn check_phone(
        &self,
        track: &mut Track,
        phones: &[Detection],
        now: Duration,
        emitter: &mut EventEmitter,
    ) -> bool {
        if !track.is_visible() || !phone_in_box(track.bbox(), phones) {
            return false;
        }
        emitter.emit(track, EventKind::PhoneDetected, now)
    }

    /// Emits `exit` for a removed track, only if it was authorized.
    pub fn on_exit(&self, track: &mut Track, now: Duration, emitter: &mut EventEmitter) -> bool {
        if !matches!(track.status(), IdentityStatus::Authorized(_)) {
            return false;
        }
        emitter.emit(track, EventKind::Exit, now)
    }
}
