use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open source: {0}")]
    Open(String),
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// A camera or recorded stream of decoded frames.
///
/// `read` returns `Ok(None)` at end of stream. After a read error the
/// caller may `open` again to reconnect.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<(), SourceError>;

    fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Releases any resources held by the source.
    fn close(&mut self) {}
}
