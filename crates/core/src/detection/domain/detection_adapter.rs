use thiserror::Error;

use crate::identity::domain::embedding::Embedding;
use crate::shared::bbox::{BBox, Detection, ObjectClass};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("malformed detector output: {0}")]
    Malformed(String),
}

/// Person and phone boxes the detector reported for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameDetections {
    pub persons: Vec<Detection>,
    pub phones: Vec<Detection>,
}

impl FrameDetections {
    pub fn new(persons: Vec<Detection>, phones: Vec<Detection>) -> Self {
        Self { persons, phones }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.phones.is_empty()
    }

    /// Drops malformed detections one by one (non-finite or inverted boxes,
    /// confidence outside `[0, 1]`, wrong class in a list) and those below
    /// the per-class confidence floor.
    pub fn sanitized(self, min_person_confidence: f64, min_phone_confidence: f64) -> Self {
        Self {
            persons: keep_valid(self.persons, ObjectClass::Person, min_person_confidence),
            phones: keep_valid(self.phones, ObjectClass::Phone, min_phone_confidence),
        }
    }
}

fn keep_valid(detections: Vec<Detection>, class: ObjectClass, min_confidence: f64) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| {
            let well_formed = d.class == class
                && d.bbox.is_well_formed()
                && d.confidence.is_finite()
                && (0.0..=1.0).contains(&d.confidence);
            if !well_formed {
                log::debug!("Dropping malformed {class:?} detection: {d:?}");
                return false;
            }
            d.confidence >= min_confidence
        })
        .collect()
}

/// Boundary to the external perception stage.
///
/// Implementations may hold model sessions or replay state, hence `&mut
/// self`. `embed` returns `Ok(None)` when no face is visible in the region.
pub trait DetectionAdapter: Send {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, DetectionError>;

    fn embed(&mut self, frame: &Frame, region: &BBox) -> Result<Option<Embedding>, DetectionError>;
}
