use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::pipeline::camera_pipeline::CameraPipeline;
use crate::pipeline::camera_runner::{CameraRunner, RunSummary};
use crate::shared::ids::CameraId;
use crate::video::domain::frame_source::FrameSource;

/// A camera pipeline paired with the source that feeds it.
pub struct CameraJob {
    pub pipeline: CameraPipeline,
    pub source: Box<dyn FrameSource>,
}

/// Runs each camera on its own thread with a shared stop flag.
///
/// Cameras share nothing but what their pipelines were built with (the
/// registry cache and, typically, a channel event sink).
pub struct ThreadedCameraSupervisor {
    backoff: Duration,
    stop: Arc<AtomicBool>,
    handles: Vec<(CameraId, JoinHandle<RunSummary>)>,
}

impl ThreadedCameraSupervisor {
    pub fn new(backoff: Duration) -> Self {
        Self::with_stop_flag(backoff, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_stop_flag(backoff: Duration, stop: Arc<AtomicBool>) -> Self {
        Self {
            backoff,
            stop,
            handles: Vec::new(),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn spawn(&mut self, job: CameraJob) -> std::io::Result<()> {
        let CameraJob {
            mut pipeline,
            mut source,
        } = job;
        let camera_id = pipeline.camera_id().clone();
        let runner = CameraRunner::new(self.backoff, self.stop.clone());

        let handle = std::thread::Builder::new()
            .name(format!("camera-{camera_id}"))
            .spawn(move || runner.run(&mut pipeline, source.as_mut()))?;

        log::info!("Started camera {camera_id}");
        self.handles.push((camera_id, handle));
        Ok(())
    }

    pub fn camera_count(&self) -> usize {
        self.handles.len()
    }

    /// Asks every camera to stop after its current frame.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Waits for every camera. A camera whose thread panicked is logged and
    /// left out of the result.
    pub fn join(self) -> Vec<RunSummary> {
        let mut summaries = Vec::with_capacity(self.handles.len());
        for (camera_id, handle) in self.handles {
            match handle.join() {
                Ok(summary) => {
                    log::info!(
                        "Camera {camera_id} finished: {} frames, {} events, {} reconnects",
                        summary.frames,
                        summary.events,
                        summary.reconnects
                    );
                    summaries.push(summary);
                }
                Err(_) => log::error!("Camera {camera_id} thread panicked"),
            }
        }
        summaries
    }
}
