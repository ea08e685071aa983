use super::embedding::Embedding;
use super::registry_snapshot::{RegistrySnapshot, SubjectMatch};

#[derive(Clone, Debug, PartialEq)]
pub enum DuplicateVerdict {
    /// No registered subject is similar enough; `closest` is informative only.
    Unique { closest: Option<SubjectMatch> },
    Duplicate(SubjectMatch),
}

/// Rejects registrations whose face already belongs to someone registered.
///
/// Uses the same matching routine as recognition with its own threshold,
/// which must be stricter than the recognition threshold.
#[derive(Clone, Debug)]
pub struct DuplicateChecker {
    threshold: f64,
}

impl DuplicateChecker {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn check(&self, snapshot: &RegistrySnapshot, embedding: &Embedding) -> DuplicateVerdict {
        match snapshot.best_match(embedding) {
            Some(m) if m.similarity >= self.threshold => {
                log::warn!(
                    "Duplicate face: matches {} with similarity {:.3}",
                    m.name,
                    m.similarity
                );
                DuplicateVerdict::Duplicate(m)
            }
            closest => DuplicateVerdict::Unique { closest },
        }
    }
}
