use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::events::domain::event::Event;
use crate::events::domain::event_sink::{EventSink, SinkError};

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Hands events to another thread without blocking the camera loop.
///
/// A full channel drops the event and reports `SinkError::Full`.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: Sender<Event>,
}

impl ChannelEventSink {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<Event>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

/// Drains `rx` into `sink` until every sender is dropped. Returns the
/// number of events published successfully.
pub fn spawn_event_writer(rx: Receiver<Event>, mut sink: Box<dyn EventSink>) -> JoinHandle<usize> {
    std::thread::spawn(move || {
        let mut written = 0;
        for event in rx {
            match sink.publish(&event) {
                Ok(()) => written += 1,
                Err(e) => log::warn!("Dropping {} event: {e}", event.kind),
            }
        }
        if let Err(e) = sink.flush() {
            log::warn!("Failed to flush event output: {e}");
        }
        written
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::domain::event::EventKind;
    use crate::shared::ids::{CameraId, TrackId};
    use crate::testing::RecordingSink;
    use std::time::Duration;

    fn event(track: u64) -> Event {
        Event {
            kind: EventKind::Entry,
            camera_id: CameraId::new("cam"),
            track_id: TrackId(track),
            subject: Some("Alice".into()),
            confidence: Some(0.8),
            timestamp: Duration::ZERO,
        }
    }

    #[test]
    fn test_full_channel_reports_full() {
        let (mut sink, _rx) = ChannelEventSink::bounded(1);
        sink.publish(&event(1)).unwrap();
        assert!(matches!(sink.publish(&event(2)), Err(SinkError::Full)));
    }

    #[test]
    fn test_dropped_receiver_reports_disconnected() {
        let (mut sink, rx) = ChannelEventSink::bounded(4);
        drop(rx);
        assert!(matches!(sink.publish(&event(1)), Err(SinkError::Disconnected)));
    }

    #[test]
    fn test_writer_drains_until_senders_drop() {
        let (sink, rx) = ChannelEventSink::bounded(8);
        let recording = RecordingSink::new();
        let events = recording.events();
        let writer = spawn_event_writer(rx, Box::new(recording));

        let mut a = sink.clone();
        let mut b = sink;
        a.publish(&event(1)).unwrap();
        b.publish(&event(2)).unwrap();
        drop(a);
        drop(b);

        assert_eq!(writer.join().unwrap(), 2);
        assert_eq!(events.lock().unwrap().len(), 2);
    }
}
