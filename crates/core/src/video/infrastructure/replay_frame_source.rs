use std::sync::Arc;

use crate::detection::infrastructure::replay_recording::ReplayRecording;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Yields one pixel-less frame per recorded line, stamped with the recorded
/// time. Paired with the replay detection adapter, which looks detections up
/// by the same frame index.
pub struct ReplayFrameSource {
    recording: Arc<ReplayRecording>,
    position: usize,
    opened: bool,
}

impl ReplayFrameSource {
    pub fn new(recording: Arc<ReplayRecording>) -> Self {
        Self {
            recording,
            position: 0,
            opened: false,
        }
    }
}

impl FrameSource for ReplayFrameSource {
    /// Reopening continues where the stream left off.
    fn open(&mut self) -> Result<(), SourceError> {
        self.opened = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.opened {
            return Err(SourceError::Read("source not open".into()));
        }
        let Some(recorded) = self.recording.get(self.position) else {
            return Ok(None);
        };
        let frame = Frame::empty(self.position, recorded.timestamp);
        self.position += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.opened = false;
    }
}
