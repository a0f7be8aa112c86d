//! Bulk-loaded registries: every galaxy, every cluster, indexed by type.
//!
//! Registries are single-caller structures: duplicate tracking and
//! in-place merges are not internally synchronized, so concurrent use
//! needs an external lock at the registry boundary.

use indexmap::IndexMap;

use serde_json::Value;

use crate::core::{Cluster, ClusterValue, CoreError, Galaxy, MachineTag, UnableToRevertMachinetag};
use crate::schema::{SchemaError, SchemaValidator, default_validator};
use crate::store::{DocumentStore, Kind, StoreError};

/// All galaxies, keyed by galaxy type.
///
/// On a duplicate type within one load batch the later record wins; the
/// overwrite is logged, not reported.
pub struct Galaxies {
    galaxies: IndexMap<String, Galaxy>,
}

impl Galaxies {
    /// Load every galaxy document the store exposes.
    pub fn from_store(store: &dyn DocumentStore) -> crate::Result<Self> {
        Self::from_records(store.enumerate(Kind::Galaxies)?)
    }

    /// Build from an explicit batch of raw records.
    pub fn from_records(records: Vec<Value>) -> crate::Result<Self> {
        let mut galaxies = IndexMap::new();
        for record in records {
            let galaxy = Galaxy::from_value(record)?;
            let key = galaxy.galaxy_type.clone();
            if galaxies.insert(key.clone(), galaxy).is_some() {
                tracing::warn!(
                    galaxy_type = %key,
                    "duplicate galaxy type in load batch, later record wins"
                );
            }
        }
        tracing::debug!(count = galaxies.len(), "loaded galaxies");
        Ok(Self { galaxies })
    }

    pub fn get(&self, galaxy_type: &str) -> Option<&Galaxy> {
        self.galaxies.get(galaxy_type)
    }

    pub fn contains(&self, galaxy_type: &str) -> bool {
        self.galaxies.contains_key(galaxy_type)
    }

    pub fn len(&self) -> usize {
        self.galaxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.galaxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Galaxy)> {
        self.galaxies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Validate every loaded record with the compiled-in validator.
    pub fn validate_with_schema(&self, store: &dyn DocumentStore) -> crate::Result<()> {
        match default_validator() {
            Some(validator) => self.validate_with(store, validator.as_ref()),
            None => Err(SchemaError::Unavailable.into()),
        }
    }

    /// Validate every loaded record with an injected validator,
    /// propagating the first failure.
    pub fn validate_with(
        &self,
        store: &dyn DocumentStore,
        validator: &dyn SchemaValidator,
    ) -> crate::Result<()> {
        let schema = store.load_schema(Kind::Galaxies)?;
        for galaxy in self.galaxies.values() {
            validator.validate(galaxy.original(), &schema)?;
        }
        Ok(())
    }

    /// Write one galaxy back through the store.
    pub fn save(&self, store: &dyn DocumentStore, galaxy_type: &str) -> crate::Result<()> {
        let galaxy = self.get(galaxy_type).ok_or_else(|| StoreError::NotFound {
            kind: Kind::Galaxies,
            name: galaxy_type.to_string(),
        })?;
        store.save(Kind::Galaxies, galaxy_type, &galaxy.to_value())?;
        Ok(())
    }
}

/// All clusters, keyed by cluster type. Same duplicate-type policy as
/// [`Galaxies`].
#[derive(Debug)]
pub struct Clusters {
    clusters: IndexMap<String, Cluster>,
}

impl Clusters {
    /// Load every cluster document the store exposes.
    pub fn from_store(store: &dyn DocumentStore, skip_duplicates: bool) -> crate::Result<Self> {
        Self::from_records(store.enumerate(Kind::Clusters)?, skip_duplicates)
    }

    /// Build from an explicit batch of raw records.
    ///
    /// Within-cluster value duplicates follow `skip_duplicates`; all
    /// other construction errors abort the batch.
    pub fn from_records(records: Vec<Value>, skip_duplicates: bool) -> crate::Result<Self> {
        let mut clusters = IndexMap::new();
        for record in records {
            let cluster = Cluster::from_value(record, skip_duplicates)?;
            let key = cluster.cluster_type.clone();
            if clusters.insert(key.clone(), cluster).is_some() {
                tracing::warn!(
                    cluster_type = %key,
                    "duplicate cluster type in load batch, later record wins"
                );
            }
        }
        tracing::debug!(count = clusters.len(), "loaded clusters");
        Ok(Self { clusters })
    }

    pub fn get(&self, cluster_type: &str) -> Option<&Cluster> {
        self.clusters.get(cluster_type)
    }

    pub fn get_mut(&mut self, cluster_type: &str) -> Option<&mut Cluster> {
        self.clusters.get_mut(cluster_type)
    }

    pub fn contains(&self, cluster_type: &str) -> bool {
        self.clusters.contains_key(cluster_type)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cluster)> {
        self.clusters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every cluster's machinetag list, in cluster load order.
    pub fn all_machinetags(&self) -> Vec<Vec<String>> {
        self.clusters.values().map(Cluster::machinetags).collect()
    }

    /// Map a machinetag back to its `(cluster, value)` pair.
    ///
    /// Parse failure, unknown type and unknown value all collapse into
    /// [`UnableToRevertMachinetag`]; callers who need the distinction do
    /// not exist.
    pub fn revert_machinetag(
        &self,
        tag: &str,
    ) -> Result<(&Cluster, &ClusterValue), CoreError> {
        let unable = || UnableToRevertMachinetag {
            tag: tag.to_string(),
        };
        let parsed = MachineTag::parse(tag).map_err(|_| unable())?;
        let cluster = self.get(&parsed.tag_type).ok_or_else(unable)?;
        let value = cluster.get(&parsed.value).ok_or_else(unable)?;
        Ok((cluster, value))
    }

    /// Run [`Cluster::search`] over every cluster; clusters with no
    /// match are omitted.
    pub fn search(&self, query: &str) -> Vec<(&Cluster, Vec<&ClusterValue>)> {
        self.clusters
            .values()
            .filter_map(|cluster| {
                let matches = cluster.search(query);
                (!matches.is_empty()).then_some((cluster, matches))
            })
            .collect()
    }

    /// Like [`search`](Clusters::search), returning machinetags.
    pub fn search_tags(&self, query: &str) -> Vec<(&Cluster, Vec<String>)> {
        self.clusters
            .values()
            .filter_map(|cluster| {
                let matches = cluster.search_tags(query);
                (!matches.is_empty()).then_some((cluster, matches))
            })
            .collect()
    }

    /// Validate every loaded record with the compiled-in validator.
    pub fn validate_with_schema(&self, store: &dyn DocumentStore) -> crate::Result<()> {
        match default_validator() {
            Some(validator) => self.validate_with(store, validator.as_ref()),
            None => Err(SchemaError::Unavailable.into()),
        }
    }

    /// Validate every loaded record with an injected validator,
    /// propagating the first failure.
    pub fn validate_with(
        &self,
        store: &dyn DocumentStore,
        validator: &dyn SchemaValidator,
    ) -> crate::Result<()> {
        let schema = store.load_schema(Kind::Clusters)?;
        for cluster in self.clusters.values() {
            validator.validate(cluster.original(), &schema)?;
        }
        Ok(())
    }

    /// Write one cluster back through the store.
    pub fn save(&self, store: &dyn DocumentStore, cluster_type: &str) -> crate::Result<()> {
        let cluster = self.get(cluster_type).ok_or_else(|| StoreError::NotFound {
            kind: Kind::Clusters,
            name: cluster_type.to_string(),
        })?;
        store.save(Kind::Clusters, cluster_type, &cluster.to_value())?;
        Ok(())
    }
}
