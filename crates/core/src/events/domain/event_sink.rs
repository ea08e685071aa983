use thiserror::Error;

use super::event::Event;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("event sink disconnected")]
    Disconnected,
    #[error("event sink is full")]
    Full,
    #[error("event sink I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fire-and-forget destination for events. Failures are reported to the
/// caller, which logs them; nothing is retried.
pub trait EventSink: Send {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
