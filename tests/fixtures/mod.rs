#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

use misp_galaxies::store::{DocumentStore, FsStore, Kind};

/// Store over the corpus shipped with the crate.
pub fn bundled_store() -> FsStore {
    FsStore::new(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join("misp-galaxy"),
    )
}

/// Empty corpus in a temp directory.
pub struct TempCorpus {
    _temp: TempDir,
    root: PathBuf,
}

impl TempCorpus {
    pub fn new() -> std::io::Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("misp-galaxy");
        std::fs::create_dir_all(root.join("galaxies"))?;
        std::fs::create_dir_all(root.join("clusters"))?;
        Ok(Self { _temp: temp, root })
    }

    pub fn store(&self) -> FsStore {
        FsStore::new(&self.root)
    }

    pub fn write_cluster(&self, name: &str, record: &Value) {
        self.store()
            .save(Kind::Clusters, name, record)
            .expect("write cluster fixture");
    }

    pub fn write_galaxy(&self, name: &str, record: &Value) {
        self.store()
            .save(Kind::Galaxies, name, record)
            .expect("write galaxy fixture");
    }

    pub fn cluster_path(&self, name: &str) -> PathBuf {
        self.root.join("clusters").join(format!("{name}.json"))
    }
}

pub fn cluster_record(cluster_type: &str, values: Value) -> Value {
    json!({
        "name": cluster_type,
        "type": cluster_type,
        "source": "test",
        "authors": ["tester"],
        "description": "fixture cluster",
        "uuid": "00000000-0000-0000-0000-000000000000",
        "version": 1,
        "category": "actor",
        "values": values
    })
}

pub fn galaxy_record(galaxy_type: &str) -> Value {
    json!({
        "type": galaxy_type,
        "name": galaxy_type,
        "icon": "map",
        "description": "fixture galaxy",
        "version": 1,
        "uuid": "00000000-0000-0000-0000-000000000001"
    })
}
