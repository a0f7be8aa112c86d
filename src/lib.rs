#![forbid(unsafe_code)]

//! Read/query layer over the MISP galaxy taxonomy corpus: load the
//! flat-file records, index them by type, search values and synonyms,
//! and map machinetags back to the records they name.

#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod error;
mod paths;
pub mod registry;
pub mod schema;
pub mod store;
#[cfg(feature = "cli")]
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    Cluster, ClusterValue, ClusterValueMeta, CoreError, DuplicateValue, Galaxy, InvalidRecord,
    MISP_GALAXY_NAMESPACE, MachineTag, MalformedTag, NotFound, RecordKind, RelatedValue,
    UnableToRevertMachinetag,
};
pub use crate::registry::{Clusters, Galaxies};
pub use crate::schema::{SchemaError, SchemaValidator};
pub use crate::store::{DocumentStore, FsStore, Kind, StoreError};
