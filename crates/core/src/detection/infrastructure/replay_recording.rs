use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection_adapter::FrameDetections;
use crate::identity::domain::embedding::Embedding;
use crate::shared::bbox::{BBox, Detection};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn default_confidence() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    pub bbox: BBox,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Face embedding the perception stage computed for this box, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

/// One line of a recording: everything the detector saw in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(rename = "timestamp_secs", with = "crate::shared::duration_secs")]
    pub timestamp: Duration,
    #[serde(default)]
    pub persons: Vec<RecordedDetection>,
    #[serde(default)]
    pub phones: Vec<RecordedDetection>,
}

impl RecordedFrame {
    pub fn detections(&self) -> FrameDetections {
        FrameDetections::new(
            self.persons
                .iter()
                .map(|d| Detection::person(d.bbox, d.confidence))
                .collect(),
            self.phones
                .iter()
                .map(|d| Detection::phone(d.bbox, d.confidence))
                .collect(),
        )
    }
}

/// Detections recorded from a camera, one JSON object per frame:
///
/// ```json
/// {"timestamp_secs": 0.033, "persons": [{"bbox": [10, 10, 50, 90], "confidence": 0.9,
///   "embedding": [0.1, 0.2]}], "phones": []}
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayRecording {
    frames: Vec<RecordedFrame>,
}

impl ReplayRecording {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self { frames }
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(BufReader::new(file)).map_err(|e| match e {
            ReplayError::Io { source, .. } => ReplayError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Blank lines are skipped; line numbers in errors are 1-based.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ReplayError::Io {
                path: PathBuf::new(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line)
                .map_err(|source| ReplayError::Parse { line: i + 1, source })?;
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&RecordedFrame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
