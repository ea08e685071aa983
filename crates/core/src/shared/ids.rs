use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a track within one camera. Allocated monotonically and
/// never reused for the lifetime of a track store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a registered subject in the registry store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_display() {
        assert_eq!(TrackId(7).to_string(), "#7");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&TrackId(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&SubjectId(12)).unwrap(), "12");
        assert_eq!(
            serde_json::to_string(&CameraId::new("lobby")).unwrap(),
            "\"lobby\""
        );
    }

    #[test]
    fn test_track_ids_order_numerically() {
        let mut ids = vec![TrackId(10), TrackId(2), TrackId(7)];
        ids.sort();
        assert_eq!(ids, vec![TrackId(2), TrackId(7), TrackId(10)]);
    }
}
