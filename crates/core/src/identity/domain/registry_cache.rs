use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::duplicate_checker::{DuplicateChecker, DuplicateVerdict};
use super::embedding::Embedding;
use super::registry_snapshot::RegistrySnapshot;
use super::registry_store::{RegisteredSubject, RegistryError, RegistryStore};
use crate::shared::ids::SubjectId;

struct CachedSnapshot {
    snapshot: Arc<RegistrySnapshot>,
    loaded_at: Instant,
}

/// In-process cache of the registry, shared by every camera pipeline.
///
/// Readers get an `Arc` to an immutable snapshot; a reload builds a complete
/// new snapshot and swaps it in under the write lock, so no reader ever sees
/// a partially loaded registry. The snapshot is reloaded after its TTL
/// expires and eagerly after every successful `register`/`delete` made
/// through the cache. Writes are serialized so a duplicate check and the
/// store write it guards see the same registry.
pub struct RegistryCache {
    store: Arc<dyn RegistryStore>,
    ttl: Duration,
    duplicate_checker: DuplicateChecker,
    state: RwLock<Option<CachedSnapshot>>,
    writer: Mutex<()>,
}

impl RegistryCache {
    pub fn new(store: Arc<dyn RegistryStore>, ttl: Duration, duplicate_threshold: f64) -> Self {
        Self {
            store,
            ttl,
            duplicate_checker: DuplicateChecker::new(duplicate_threshold),
            state: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot, loading it if cold or expired.
    ///
    /// A failed reload while a previous snapshot exists keeps serving the
    /// previous one and retries after another TTL. Fails only when no
    /// snapshot has ever been loaded.
    pub fn snapshot(&self) -> Result<Arc<RegistrySnapshot>, RegistryError> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = state.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = state.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.snapshot.clone());
            }
        }

        match self.store.load_all() {
            Ok(subjects) => {
                let snapshot = Arc::new(RegistrySnapshot::build(&subjects));
                log::info!(
                    "Loaded registry: {} subjects, {} templates",
                    snapshot.subject_count(),
                    snapshot.template_count()
                );
                *state = Some(CachedSnapshot {
                    snapshot: snapshot.clone(),
                    loaded_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(e) => match state.as_mut() {
                Some(cached) => {
                    log::warn!("Registry reload failed, keeping previous snapshot: {e}");
                    cached.loaded_at = Instant::now();
                    Ok(cached.snapshot.clone())
                }
                None => Err(e),
            },
        }
    }

    /// Drops the cached snapshot; the next `snapshot()` call reloads.
    pub fn invalidate(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Registers a face template after checking it against the registry.
    ///
    /// A face matching a *different* subject above the duplicate threshold is
    /// rejected with `RegistryError::Duplicate` and nothing changes. A face
    /// matching the same name is accepted as an additional template.
    pub fn register(
        &self,
        name: &str,
        embedding: &Embedding,
        photo: Option<&Path>,
    ) -> Result<SubjectId, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::Invalid("name must not be empty".into()));
        }
        if embedding.normalized().is_none() {
            return Err(RegistryError::Invalid(
                "embedding must be non-zero and finite".into(),
            ));
        }

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.fresh_snapshot()?;
        if let Some(expected) = snapshot.dimension() {
            if embedding.dim() != expected {
                return Err(RegistryError::DimensionMismatch {
                    expected,
                    actual: embedding.dim(),
                });
            }
        }
        if let DuplicateVerdict::Duplicate(existing) =
            self.duplicate_checker.check(&snapshot, embedding)
        {
            if existing.name != name {
                return Err(RegistryError::Duplicate {
                    name: name.to_string(),
                    existing: existing.name,
                    similarity: existing.similarity,
                });
            }
        }

        let id = self.store.register(name, embedding, photo)?;
        log::info!("Registered {name} as subject {id}");
        self.reload_after_write();
        Ok(id)
    }

    pub fn delete(&self, id: SubjectId) -> Result<(), RegistryError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.delete(id)?;
        log::info!("Deleted subject {id}");
        self.reload_after_write();
        Ok(())
    }

    /// Registered subjects straight from the store, bypassing the cache.
    pub fn subjects(&self) -> Result<Vec<RegisteredSubject>, RegistryError> {
        self.store.load_all()
    }

    /// Duplicate checks must see the latest registry, not a cached copy.
    fn fresh_snapshot(&self) -> Result<Arc<RegistrySnapshot>, RegistryError> {
        let subjects = self.store.load_all()?;
        Ok(Arc::new(RegistrySnapshot::build(&subjects)))
    }

    fn reload_after_write(&self) {
        self.invalidate();
        if let Err(e) = self.snapshot() {
            log::warn!("Registry reload after write failed: {e}");
        }
    }
}
