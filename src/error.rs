use thiserror::Error;

use crate::core::CoreError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability
/// errors. Callers match on the capability variant they care about and
/// propagate the rest.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
