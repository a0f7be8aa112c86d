//! Flat-file document store.
//!
//! Corpus layout mirrors the misp-galaxy repository:
//!
//! ```text
//! <root>/galaxies/<type>.json
//! <root>/clusters/<type>.json
//! <root>/schema_galaxies.json
//! <root>/schema_clusters.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::paths;

use super::canon::to_stable_json_bytes;
use super::{DocumentStore, Kind, StoreError};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store over the bundled corpus, honoring the `MISP_GALAXIES_DATA`
    /// override.
    pub fn bundled() -> Self {
        Self::new(paths::default_data_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, kind: Kind, name: &str) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{name}.json"))
    }

    fn read_document(path: &Path) -> Result<Value, StoreError> {
        let bytes = fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DocumentStore for FsStore {
    /// Documents in file-name order, so load order is deterministic.
    fn enumerate(&self, kind: Kind) -> Result<Vec<Value>, StoreError> {
        let dir = self.root.join(kind.dir());
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        tracing::debug!(kind = %kind, count = paths.len(), "enumerating corpus documents");
        paths.iter().map(|path| Self::read_document(path)).collect()
    }

    fn load(&self, kind: Kind, name: &str) -> Result<Value, StoreError> {
        let path = self.document_path(kind, name);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind,
                name: name.to_string(),
            });
        }
        Self::read_document(&path)
    }

    fn save(&self, kind: Kind, name: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.document_path(kind, name);
        let bytes = to_stable_json_bytes(record).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        let temp = tempfile::NamedTempFile::new_in(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        fs::write(temp.path(), &bytes).map_err(|source| StoreError::Io {
            path: temp.path().to_path_buf(),
            source,
        })?;
        temp.persist(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source: source.error,
        })?;
        Ok(())
    }

    fn load_schema(&self, kind: Kind) -> Result<Value, StoreError> {
        let path = self.root.join(kind.schema_file());
        Self::read_document(&path)
    }
}
