use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ids::{CameraId, TrackId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Entry,
    Exit,
    Unauthorized,
    PhoneDetected,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Unauthorized => "unauthorized",
            Self::PhoneDetected => "phone_detected",
        }
    }

    /// Kinds that describe a named subject rather than a single track and
    /// carry the match confidence.
    pub fn is_subject_scoped(&self) -> bool {
        matches!(self, Self::Entry | Self::Exit)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub camera_id: CameraId,
    pub track_id: TrackId,
    pub subject: Option<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "timestamp_secs", with = "crate::shared::duration_secs")]
    pub timestamp: Duration,
}

/// Last emission time per event kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventCooldowns {
    last: HashMap<EventKind, Duration>,
}

impl EventCooldowns {
    pub fn last(&self, kind: EventKind) -> Option<Duration> {
        self.last.get(&kind).copied()
    }

    pub fn record(&mut self, kind: EventKind, now: Duration) {
        self.last.insert(kind, now);
    }

    /// True while fewer than `cooldown` has elapsed since the last `kind`.
    pub fn is_cooling(&self, kind: EventKind, now: Duration, cooldown: Duration) -> bool {
        self.last(kind)
            .is_some_and(|last| now.saturating_sub(last) < cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::PhoneDetected).unwrap();
        assert_eq!(json, "\"phone_detected\"");
        assert_eq!(EventKind::PhoneDetected.to_string(), "phone_detected");
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event {
            kind: EventKind::Entry,
            camera_id: CameraId::new("lobby"),
            track_id: TrackId(3),
            subject: Some("Alice".into()),
            confidence: Some(0.92),
            timestamp: Duration::from_millis(1500),
        };

        let value: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["kind"], "entry");
        assert_eq!(value["camera_id"], "lobby");
        assert_eq!(value["track_id"], 3);
        assert_eq!(value["subject"], "Alice");
        assert_eq!(value["timestamp_secs"], 1.5);
    }

    #[test]
    fn test_cooldown_window() {
        let mut cooldowns = EventCooldowns::default();
        let window = Duration::from_secs(10);
        assert!(!cooldowns.is_cooling(EventKind::PhoneDetected, Duration::ZERO, window));

        cooldowns.record(EventKind::PhoneDetected, Duration::from_secs(5));

        assert!(cooldowns.is_cooling(EventKind::PhoneDetected, Duration::from_secs(14), window));
        assert!(!cooldowns.is_cooling(EventKind::PhoneDetected, Duration::from_secs(15), window));
        assert!(!cooldowns.is_cooling(EventKind::Entry, Duration::from_secs(6), window));
    }

    #[test]
    fn test_zero_cooldown_never_cools() {
        let mut cooldowns = EventCooldowns::default();
        cooldowns.record(EventKind::Exit, Duration::from_secs(1));
        assert!(!cooldowns.is_cooling(EventKind::Exit, Duration::from_secs(1), Duration::ZERO));
    }
}
