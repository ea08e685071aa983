use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::camera_pipeline::CameraPipeline;
use crate::shared::ids::CameraId;
use crate::video::domain::frame_source::FrameSource;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub camera_id: CameraId,
    pub frames: usize,
    pub events: usize,
    /// Failed opens and reads that were followed by a backoff.
    pub reconnects: usize,
}

/// Drives one camera pipeline from a frame source until end of stream or
/// until the stop flag is raised.
///
/// Source failures are never fatal: the runner waits `backoff` and reopens,
/// indefinitely. The stop flag is checked between frames and during
/// backoff, never in the middle of a frame.
pub struct CameraRunner {
    backoff: Duration,
    stop: Arc<AtomicBool>,
}

impl CameraRunner {
    pub fn new(backoff: Duration, stop: Arc<AtomicBool>) -> Self {
        Self { backoff, stop }
    }

    pub fn run(&self, pipeline: &mut CameraPipeline, source: &mut dyn FrameSource) -> RunSummary {
        let camera_id = pipeline.camera_id().clone();
        let mut frames = 0;
        let mut reconnects = 0;
        let mut connected = false;

        while !self.stopped() {
            if !connected {
                match source.open() {
                    Ok(()) => {
                        log::info!("[{camera_id}] source opened");
                        connected = true;
                    }
                    Err(e) => {
                        log::warn!("[{camera_id}] {e}; retrying in {:?}", self.backoff);
                        reconnects += 1;
                        self.wait_backoff();
                        continue;
                    }
                }
            }

            match source.read() {
                Ok(Some(frame)) => {
                    pipeline.process_frame(&frame);
                    frames += 1;
                }
                Ok(None) => {
                    log::info!("[{camera_id}] end of stream");
                    break;
                }
                Err(e) => {
                    log::warn!("[{camera_id}] {e}; reconnecting in {:?}", self.backoff);
                    source.close();
                    connected = false;
                    reconnects += 1;
                    self.wait_backoff();
                }
            }
        }

        source.close();
        pipeline.finish();
        RunSummary {
            camera_id,
            frames,
            events: pipeline.events_emitted(),
            reconnects,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn wait_backoff(&self) {
        let deadline = Instant::now() + self.backoff;
        loop {
            if self.stopped() {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            std::thread::sleep(remaining.min(STOP_POLL_INTERVAL));
        }
    }
}
