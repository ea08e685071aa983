use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::identity::domain::embedding::Embedding;
use crate::identity::domain::registry_store::{RegisteredSubject, RegistryError, RegistryStore};
use crate::shared::constants::{CONFIG_DIR_NAME, REGISTRY_FILE_NAME};
use crate::shared::ids::SubjectId;

const PHOTOS_DIR_NAME: &str = "photos";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    next_id: u64,
    subjects: Vec<StoredSubject>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredSubject {
    id: SubjectId,
    name: String,
    embeddings: Vec<Embedding>,
    #[serde(default)]
    photos: Vec<PathBuf>,
}

/// Registry persisted as one JSON document, with registration photos copied
/// into a `photos/` directory next to it.
///
/// A missing file is an empty registry. Writes go to a temp file that is
/// renamed over the original, so readers never see a half-written registry.
pub struct JsonRegistryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/gatekeeper/registry.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(CONFIG_DIR_NAME).join(REGISTRY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn photos_dir(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(PHOTOS_DIR_NAME)
    }

    fn read(&self) -> Result<RegistryFile, RegistryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RegistryFile::default()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &RegistryFile) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(parent, source))?;
        }
        let json = serde_json::to_string_pretty(file).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let temp_path = self.path.with_extension("json.part");
        fs::write(&temp_path, json).map_err(|source| self.io_error(&temp_path, source))?;
        fs::rename(&temp_path, &self.path).map_err(|source| self.io_error(&self.path, source))
    }

    fn copy_photo(&self, id: SubjectId, n: usize, photo: &Path) -> Result<PathBuf, RegistryError> {
        let dir = self.photos_dir();
        fs::create_dir_all(&dir).map_err(|source| self.io_error(&dir, source))?;
        let ext = photo
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let dest = dir.join(format!("{}_{n}.{ext}", id.0));
        fs::copy(photo, &dest).map_err(|source| self.io_error(photo, source))?;
        Ok(dest)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl RegistryStore for JsonRegistryStore {
    fn load_all(&self) -> Result<Vec<RegisteredSubject>, RegistryError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .read()?
            .subjects
            .into_iter()
            .map(|s| RegisteredSubject {
                id: s.id,
                name: s.name,
                embeddings: s.embeddings,
            })
            .collect())
    }

    fn register(
        &self,
        name: &str,
        embedding: &Embedding,
        photo: Option<&Path>,
    ) -> Result<SubjectId, RegistryError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;

        let index = match file.subjects.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                file.next_id += 1;
                file.subjects.push(StoredSubject {
                    id: SubjectId(file.next_id),
                    name: name.to_string(),
                    embeddings: Vec::new(),
                    photos: Vec::new(),
                });
                file.subjects.len() - 1
            }
        };

        let subject = &mut file.subjects[index];
        subject.embeddings.push(embedding.clone());
        let id = subject.id;
        if let Some(photo) = photo {
            let n = subject.photos.len();
            let stored = self.copy_photo(id, n, photo)?;
            file.subjects[index].photos.push(stored);
        }

        self.write(&file)?;
        Ok(id)
    }

    fn delete(&self, id: SubjectId) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;
        let index = file
            .subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or(RegistryError::NotFound(id))?;

        let removed = file.subjects.remove(index);
        self.write(&file)?;

        for photo in removed.photos {
            if let Err(e) = fs::remove_file(&photo) {
                log::warn!("Failed to remove photo {}: {e}", photo.display());
            }
        }
        Ok(())
    }
}
