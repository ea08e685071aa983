use std::sync::Arc;

use super::replay_recording::ReplayRecording;
use crate::detection::domain::detection_adapter::{DetectionAdapter, DetectionError, FrameDetections};
use crate::identity::domain::embedding::Embedding;
use crate::shared::bbox::BBox;
use crate::shared::constants::REPLAY_EMBED_MIN_IOU;
use crate::shared::frame::Frame;

/// Replays recorded detections by frame index.
///
/// `embed` hands out the embedding recorded for the person box that best
/// overlaps the requested region, so identity resolution behaves as if a
/// face model had run on that crop.
pub struct ReplayDetectionAdapter {
    recording: Arc<ReplayRecording>,
    min_iou: f64,
}

impl ReplayDetectionAdapter {
    pub fn new(recording: Arc<ReplayRecording>) -> Self {
        Self {
            recording,
            min_iou: REPLAY_EMBED_MIN_IOU,
        }
    }
}

impl DetectionAdapter for ReplayDetectionAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, DetectionError> {
        self.recording
            .get(frame.index())
            .map(|recorded| recorded.detections())
            .ok_or_else(|| {
                DetectionError::Unavailable(format!("no recorded frame {}", frame.index()))
            })
    }

    fn embed(&mut self, frame: &Frame, region: &BBox) -> Result<Option<Embedding>, DetectionError> {
        let Some(recorded) = self.recording.get(frame.index()) else {
            return Err(DetectionError::Unavailable(format!(
                "no recorded frame {}",
                frame.index()
            )));
        };

        let best = recorded
            .persons
            .iter()
            .map(|p| (p.bbox.iou(region), p))
            .filter(|(iou, _)| *iou >= self.min_iou)
            .max_by(|a, b| a.0.total_cmp(&b.0));

        Ok(best.and_then(|(_, p)| p.embedding.clone()))
    }
}
