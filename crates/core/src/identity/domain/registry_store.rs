use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::embedding::Embedding;
use crate::shared::ids::SubjectId;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Unreachable(String),
    #[error("registry I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("registry data at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{name}' matches registered subject '{existing}' (similarity {similarity:.3})")]
    Duplicate {
        name: String,
        existing: String,
        similarity: f64,
    },
    #[error("subject {0} not found")]
    NotFound(SubjectId),
    #[error("embedding has dimension {actual}, registry uses {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid registration: {0}")]
    Invalid(String),
}

/// A registered person with every face template stored for them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisteredSubject {
    pub id: SubjectId,
    pub name: String,
    pub embeddings: Vec<Embedding>,
}

/// Persistence boundary for registered identities.
///
/// Shared between camera pipelines through the registry cache, hence
/// `&self` and `Sync`; implementations synchronize internally.
/// Registering a name that already exists adds a template to that subject
/// and returns its existing id.
pub trait RegistryStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<RegisteredSubject>, RegistryError>;

    fn register(
        &self,
        name: &str,
        embedding: &Embedding,
        photo: Option<&Path>,
    ) -> Result<SubjectId, RegistryError>;

    fn delete(&self, id: SubjectId) -> Result<(), RegistryError>;
}
