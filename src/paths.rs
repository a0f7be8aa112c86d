//! Corpus location helpers.

use std::path::PathBuf;

/// Root of the bundled corpus.
///
/// Uses `MISP_GALAXIES_DATA` if set, otherwise the `data/misp-galaxy`
/// directory shipped with the crate.
pub(crate) fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MISP_GALAXIES_DATA")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("misp-galaxy")
}
