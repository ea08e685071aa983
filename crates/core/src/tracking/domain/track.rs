use std::fmt;
use std::time::Duration;

use crate::events::domain::event::EventCooldowns;
use crate::shared::bbox::{BBox, Detection, ObjectClass};
use crate::shared::ids::{SubjectId, TrackId};

/// Decision status of a track. `Authorized` and `Unknown` are terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityStatus {
    Identifying,
    Authorized(String),
    Unknown,
}

impl IdentityStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Identifying)
    }

    /// Subject name for events: the authorized name, `None` otherwise.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Authorized(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifying => write!(f, "identifying"),
            Self::Authorized(name) => write!(f, "authorized({name})"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IdentityMatch {
    pub subject_id: SubjectId,
    pub name: String,
    pub similarity: f64,
}

/// What the identity resolver has learned about a track so far.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdentityEvidence {
    /// Confirmed, visible frames seen by the resolver; drives the sampling cadence.
    pub frames_considered: u64,
    pub face_attempts: u32,
    pub face_detected_count: u32,
    pub no_face_count: u32,
    /// Set once and never re-evaluated.
    pub resolved: Option<IdentityMatch>,
}

/// State of one tracked object.
///
/// Fields are partitioned by writer: the associator owns the geometry and
/// counters, the identity resolver owns `identity`, and the decision stage
/// owns `status` and `cooldowns`.
#[derive(Clone, Debug)]
pub struct Track {
    id: TrackId,
    class: ObjectClass,
    bbox: BBox,
    hits: u32,
    age: u32,
    first_seen: Duration,
    last_seen: Duration,
    pub(crate) identity: IdentityEvidence,
    pub(crate) status: IdentityStatus,
    pub(crate) cooldowns: EventCooldowns,
}

impl Track {
    pub(crate) fn spawn(id: TrackId, detection: &Detection, now: Duration) -> Self {
        Self {
            id,
            class: detection.class,
            bbox: detection.bbox,
            hits: 1,
            age: 0,
            first_seen: now,
            last_seen: now,
            identity: IdentityEvidence::default(),
            status: IdentityStatus::Identifying,
            cooldowns: EventCooldowns::default(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn class(&self) -> ObjectClass {
        self.class
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn first_seen(&self) -> Duration {
        self.first_seen
    }

    pub fn last_seen(&self) -> Duration {
        self.last_seen
    }

    pub fn identity(&self) -> &IdentityEvidence {
        &self.identity
    }

    pub fn status(&self) -> &IdentityStatus {
        &self.status
    }

    pub fn cooldowns(&self) -> &EventCooldowns {
        &self.cooldowns
    }

    /// Matched to a detection in the current frame.
    pub fn is_visible(&self) -> bool {
        self.age == 0
    }

    pub(crate) fn mark_matched(&mut self, bbox: BBox, now: Duration) {
        self.bbox = bbox;
        self.hits = self.hits.saturating_add(1);
        self.age = 0;
        self.last_seen = now;
    }

    pub(crate) fn mark_missed(&mut self) {
        self.age = self.age.saturating_add(1);
    }
}
