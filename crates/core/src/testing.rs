//! Stub collaborators for unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::detection::domain::detection_adapter::{DetectionAdapter, DetectionError, FrameDetections};
use crate::events::domain::event::Event;
use crate::events::domain::event_sink::{EventSink, SinkError};
use crate::identity::domain::embedding::Embedding;
use crate::identity::domain::registry_store::{RegisteredSubject, RegistryError, RegistryStore};
use crate::shared::bbox::{BBox, Detection};
use crate::shared::frame::Frame;
use crate::shared::ids::SubjectId;

pub const FPS: u32 = 30;

/// Frame `index` (0-based) of a 30 fps stream.
pub fn frame_at(index: usize) -> Frame {
    Frame::empty(index, Duration::from_secs(index as u64) / FPS)
}

pub fn person(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
    Detection::person(BBox::new(x1, y1, x2, y2), 0.9)
}

pub fn phone(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
    Detection::phone(BBox::new(x1, y1, x2, y2), 0.8)
}

#[derive(Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Arc<Mutex<Vec<Event>>> {
        self.events.clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub struct FailingSink;

impl EventSink for FailingSink {
    fn publish(&mut self, _event: &Event) -> Result<(), SinkError> {
        Err(SinkError::Disconnected)
    }
}

type DetectFn = Box<dyn FnMut(usize) -> Result<FrameDetections, DetectionError> + Send>;
type EmbedFn = Box<dyn FnMut(usize, &BBox) -> Option<Embedding> + Send>;

/// Detection adapter scripted by frame index. Records the frame index of
/// every `embed` call.
pub struct StubAdapter {
    detect: DetectFn,
    embed: EmbedFn,
    embed_calls: Arc<Mutex<Vec<usize>>>,
}

impl StubAdapter {
    pub fn new(
        detect: impl FnMut(usize) -> Result<FrameDetections, DetectionError> + Send + 'static,
    ) -> Self {
        Self {
            detect: Box::new(detect),
            embed: Box::new(|_, _| None),
            embed_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Same detections on every frame.
    pub fn constant(detections: FrameDetections) -> Self {
        Self::new(move |_| Ok(detections.clone()))
    }

    pub fn with_embeddings(
        mut self,
        embed: impl FnMut(usize, &BBox) -> Option<Embedding> + Send + 'static,
    ) -> Self {
        self.embed = Box::new(embed);
        self
    }

    pub fn embed_calls(&self) -> Arc<Mutex<Vec<usize>>> {
        self.embed_calls.clone()
    }
}

impl DetectionAdapter for StubAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, DetectionError> {
        (self.detect)(frame.index())
    }

    fn embed(&mut self, frame: &Frame, region: &BBox) -> Result<Option<Embedding>, DetectionError> {
        self.embed_calls.lock().unwrap().push(frame.index());
        Ok((self.embed)(frame.index(), region))
    }
}

#[derive(Default)]
struct StoreState {
    subjects: Vec<RegisteredSubject>,
    next_id: u64,
    load_calls: usize,
    failing: bool,
}

/// Registry store kept in memory, with a load counter and a failure switch.
#[derive(Default)]
pub struct InMemoryRegistryStore {
    state: Mutex<StoreState>,
}

impl InMemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, embeddings: Vec<Embedding>) -> SubjectId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = SubjectId(state.next_id);
        state.subjects.push(RegisteredSubject {
            id,
            name: name.to_string(),
            embeddings,
        });
        id
    }

    pub fn load_calls(&self) -> usize {
        self.state.lock().unwrap().load_calls
    }

    pub fn subject_count(&self) -> usize {
        self.state.lock().unwrap().subjects.len()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn load_all(&self) -> Result<Vec<RegisteredSubject>, RegistryError> {
        let mut state = self.state.lock().unwrap();
        state.load_calls += 1;
        if state.failing {
            return Err(RegistryError::Unreachable("store offline".into()));
        }
        Ok(state.subjects.clone())
    }

    fn register(
        &self,
        name: &str,
        embedding: &Embedding,
        _photo: Option<&Path>,
    ) -> Result<SubjectId, RegistryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.subjects.iter_mut().find(|s| s.name == name) {
            existing.embeddings.push(embedding.clone());
            return Ok(existing.id);
        }
        state.next_id += 1;
        let id = SubjectId(state.next_id);
        state.subjects.push(RegisteredSubject {
            id,
            name: name.to_string(),
            embeddings: vec![embedding.clone()],
        });
        Ok(id)
    }

    fn delete(&self, id: SubjectId) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.subjects.len();
        state.subjects.retain(|s| s.id != id);
        if state.subjects.len() == before {
            return Err(RegistryError::NotFound(id));
        }
        Ok(())
    }
}
