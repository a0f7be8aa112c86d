//! Document store: the corpus-facing collaborator.
//!
//! The core consumes this capability; it never touches the filesystem
//! itself. [`FsStore`] is the flat-file implementation over the
//! misp-galaxy corpus layout.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

mod canon;
mod fs;

pub use canon::to_stable_json_bytes;
pub use fs::FsStore;

/// The two record families the corpus holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Galaxies,
    Clusters,
}

impl Kind {
    /// Subdirectory holding this kind's documents.
    pub fn dir(self) -> &'static str {
        match self {
            Kind::Galaxies => "galaxies",
            Kind::Clusters => "clusters",
        }
    }

    /// Schema document file name, at the corpus root.
    pub fn schema_file(self) -> &'static str {
        match self {
            Kind::Galaxies => "schema_galaxies.json",
            Kind::Clusters => "schema_clusters.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.dir()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("no {kind} document named `{name}`")]
    NotFound { kind: Kind, name: String },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed document at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save surface over the corpus.
///
/// `enumerate` yields documents in a stable order; `save` must write a
/// byte-stable serialized form so round-trip saves produce minimal
/// diffs.
pub trait DocumentStore {
    /// All documents of a kind.
    fn enumerate(&self, kind: Kind) -> Result<Vec<Value>, StoreError>;

    /// One document by name.
    fn load(&self, kind: Kind, name: &str) -> Result<Value, StoreError>;

    /// Write one document back.
    fn save(&self, kind: Kind, name: &str, record: &Value) -> Result<(), StoreError>;

    /// The kind's schema document.
    fn load_schema(&self, kind: Kind) -> Result<Value, StoreError>;
}
