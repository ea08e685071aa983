use crate::events::domain::event::Event;
use crate::events::domain::event_sink::{EventSink, SinkError};

/// Writes events to the `log` facade at info level.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        log::info!(
            target: "gatekeeper::events",
            "{} camera={} track={} subject={} confidence={} t={:.3}s",
            event.kind,
            event.camera_id,
            event.track_id,
            event.subject.as_deref().unwrap_or("-"),
            event
                .confidence
                .map_or_else(|| "-".to_string(), |c| format!("{c:.3}")),
            event.timestamp.as_secs_f64()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::domain::event::EventKind;
    use crate::shared::ids::{CameraId, TrackId};
    use std::time::Duration;

    #[test]
    fn test_publish_never_fails() {
        let event = Event {
            kind: EventKind::Unauthorized,
            camera_id: CameraId::new("gate"),
            track_id: TrackId(4),
            subject: None,
            confidence: None,
            timestamp: Duration::from_secs(15),
        };
        assert!(LogEventSink.publish(&event).is_ok());
        assert!(LogEventSink.flush().is_ok());
    }
}
