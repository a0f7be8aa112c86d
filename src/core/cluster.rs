//! A named, typed collection of cluster values.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::store::{DocumentStore, Kind};

use super::error::{CoreError, DuplicateValue, InvalidRecord, NotFound, RecordKind};
use super::machinetag::MachineTag;
use super::value::ClusterValue;

/// One taxonomy: e.g. `threat-actor` or `mitre-attack-pattern`.
///
/// Values are indexed by case-folded value string, in insertion order of
/// the first-seen entry. Not internally synchronized; concurrent callers
/// need external locking.
#[derive(Clone, Debug)]
pub struct Cluster {
    pub name: String,
    pub cluster_type: String,
    pub source: String,
    pub authors: Value,
    pub description: String,
    pub uuid: String,
    pub version: Value,
    pub category: String,
    values: IndexMap<String, ClusterValue>,
    duplicates: Vec<(String, String)>,
    original: Value,
}

impl Cluster {
    /// Build a cluster from one raw record.
    ///
    /// All of `name`, `type`, `source`, `authors`, `description`,
    /// `uuid`, `version` and `category` must be present. Entries under
    /// `values` are appended one at a time with the duplicate policy
    /// applied at each step.
    pub fn from_value(record: Value, skip_duplicates: bool) -> Result<Self, CoreError> {
        let Value::Object(obj) = &record else {
            return Err(InvalidRecord::new(RecordKind::Cluster, "record is not an object").into());
        };
        let mut cluster = Self {
            name: required_string(obj, "name")?,
            cluster_type: required_string(obj, "type")?,
            source: required_string(obj, "source")?,
            authors: required_field(obj, "authors")?,
            description: required_string(obj, "description")?,
            uuid: required_string(obj, "uuid")?,
            version: required_field(obj, "version")?,
            category: required_string(obj, "category")?,
            values: IndexMap::new(),
            duplicates: Vec::new(),
            original: Value::Null,
        };
        match obj.get("values") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                for entry in entries {
                    cluster.append(entry.clone(), skip_duplicates)?;
                }
            }
            Some(_) => {
                return Err(
                    InvalidRecord::new(RecordKind::Cluster, "`values` is not a list").into(),
                );
            }
        }
        cluster.original = record;
        Ok(cluster)
    }

    /// Load one cluster by type name from the document store.
    pub fn from_store(
        store: &dyn DocumentStore,
        cluster_type: &str,
        skip_duplicates: bool,
    ) -> crate::Result<Self> {
        let record = store.load(Kind::Clusters, cluster_type)?;
        Ok(Self::from_value(record, skip_duplicates)?)
    }

    /// Append one value record.
    pub fn append(&mut self, record: Value, skip_duplicates: bool) -> Result<(), CoreError> {
        let value = ClusterValue::from_value(record)?;
        self.append_value(value, skip_duplicates)
    }

    /// Append an already-constructed value.
    ///
    /// On a case-folded collision the index keeps the first-seen entry:
    /// with `skip_duplicates` the pair lands in the duplicates log and
    /// the new entry is dropped, otherwise the append fails.
    pub fn append_value(
        &mut self,
        value: ClusterValue,
        skip_duplicates: bool,
    ) -> Result<(), CoreError> {
        let key = value.value.to_lowercase();
        if self.values.contains_key(&key) {
            if !skip_duplicates {
                return Err(DuplicateValue {
                    cluster: self.name.clone(),
                    value: value.value,
                }
                .into());
            }
            tracing::warn!(
                cluster = %self.name,
                value = %value.value,
                "duplicate value dropped from index"
            );
            self.duplicates.push((self.name.clone(), value.value));
            return Ok(());
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Case-insensitive lookup by value string.
    pub fn get(&self, value: &str) -> Option<&ClusterValue> {
        self.values.get(&value.to_lowercase())
    }

    pub fn get_mut(&mut self, value: &str) -> Option<&mut ClusterValue> {
        self.values.get_mut(&value.to_lowercase())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains_key(&value.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in insertion order of first-seen, non-duplicate entries.
    pub fn values(&self) -> impl Iterator<Item = &ClusterValue> {
        self.values.values()
    }

    /// `(cluster_name, value)` pairs dropped by the duplicate policy.
    pub fn duplicates(&self) -> &[(String, String)] {
        &self.duplicates
    }

    /// Values whose searchable set contains `query`, case-insensitively,
    /// in index order.
    pub fn search(&self, query: &str) -> Vec<&ClusterValue> {
        let query = query.to_lowercase();
        self.values().filter(|v| v.matches(&query)).collect()
    }

    /// Like [`search`](Cluster::search), but returns the generated
    /// machinetag for each match instead of the value.
    pub fn search_tags(&self, query: &str) -> Vec<String> {
        self.search(query)
            .into_iter()
            .map(|v| self.machinetag(v).to_string())
            .collect()
    }

    /// Machinetag for one of this cluster's values.
    pub fn machinetag(&self, value: &ClusterValue) -> MachineTag {
        MachineTag::misp_galaxy(self.cluster_type.clone(), value.value.clone())
    }

    /// One machinetag per contained value.
    pub fn machinetags(&self) -> Vec<String> {
        self.values().map(|v| self.machinetag(v).to_string()).collect()
    }

    /// First value whose meta carries `external_id` equal to `id`.
    pub fn get_by_external_id(&self, id: &str) -> Result<&ClusterValue, CoreError> {
        self.values()
            .find(|v| {
                v.meta
                    .as_ref()
                    .and_then(|m| m.additional.get("external_id"))
                    .is_some_and(|external| match external {
                        Value::String(s) => s == id,
                        other => other.to_string() == id,
                    })
            })
            .ok_or_else(|| {
                NotFound::ExternalId {
                    cluster: self.name.clone(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Group `kill_chain` meta entries (`"phase:tactic"`) by phase, each
    /// phase mapping to its sorted, deduplicated tactic names.
    pub fn get_kill_chain_tactics(&self) -> BTreeMap<String, Vec<String>> {
        let mut phases: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for value in self.values() {
            let Some(meta) = &value.meta else { continue };
            let Some(Value::Array(entries)) = meta.additional.get("kill_chain") else {
                continue;
            };
            for entry in entries {
                if let Some(s) = entry.as_str()
                    && let Some((phase, tactic)) = s.split_once(':')
                {
                    phases
                        .entry(phase.to_string())
                        .or_default()
                        .insert(tactic.to_string());
                }
            }
        }
        phases
            .into_iter()
            .map(|(phase, tactics)| (phase, tactics.into_iter().collect()))
            .collect()
    }

    /// Whether the live fields (contained values included) differ from
    /// the record this cluster was loaded from.
    pub fn has_changed(&self) -> bool {
        self.to_value() != self.original
    }

    pub(crate) fn original(&self) -> &Value {
        &self.original
    }

    /// Re-emit the record.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("name".to_string(), Value::String(self.name.clone()));
        out.insert("type".to_string(), Value::String(self.cluster_type.clone()));
        out.insert("source".to_string(), Value::String(self.source.clone()));
        out.insert("authors".to_string(), self.authors.clone());
        out.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        out.insert("uuid".to_string(), Value::String(self.uuid.clone()));
        out.insert("version".to_string(), self.version.clone());
        out.insert("category".to_string(), Value::String(self.category.clone()));
        out.insert(
            "values".to_string(),
            Value::Array(self.values().map(ClusterValue::to_value).collect()),
        );
        Value::Object(out)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.machinetags().join("\n"))
    }
}

fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String, InvalidRecord> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(InvalidRecord::new(
            RecordKind::Cluster,
            format!("`{key}` is not a string"),
        )),
        None => Err(InvalidRecord::new(
            RecordKind::Cluster,
            format!("`{key}` is missing"),
        )),
    }
}

/// `version` and `authors` are typed inconsistently across corpus
/// snapshots; they are carried as-is, never coerced.
fn required_field(obj: &Map<String, Value>, key: &str) -> Result<Value, InvalidRecord> {
    match obj.get(key) {
        Some(v) => Ok(v.clone()),
        None => Err(InvalidRecord::new(
            RecordKind::Cluster,
            format!("`{key}` is missing"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> Value {
        json!({
            "name": "Threat Actor",
            "type": "threat-actor",
            "source": "MISP Project",
            "authors": ["Alexandre Dulaunoy", "Florian Roth"],
            "description": "Known or estimated adversary groups",
            "uuid": "7cdff317-a673-4474-84ec-4f1754947823",
            "version": 42,
            "category": "actor",
            "values": [
                {
                    "value": "Sofacy",
                    "uuid": "5b4ee3ea-eee3-4c8e-8323-85ae32658754",
                    "meta": {"country": "RU", "synonyms": ["APT 28", "Sednit"]}
                },
                {"value": "APT29", "meta": {"synonyms": ["Cozy Bear"]}}
            ]
        })
    }

    #[test]
    fn construction_requires_all_mandatory_fields() {
        for key in [
            "name",
            "type",
            "source",
            "authors",
            "description",
            "uuid",
            "version",
            "category",
        ] {
            let mut record = sample_record();
            record.as_object_mut().unwrap().remove(key);
            assert!(Cluster::from_value(record, false).is_err(), "{key}");
        }
        assert!(Cluster::from_value(sample_record(), false).is_ok());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let cluster = Cluster::from_value(sample_record(), false).unwrap();
        assert!(cluster.get("sofacy").is_some());
        assert!(cluster.get("SOFACY").is_some());
        assert!(cluster.contains("apt29"));
        assert!(cluster.get("unknown").is_none());
    }

    #[test]
    fn duplicate_append_fails_without_skip() {
        let mut cluster = Cluster::from_value(sample_record(), false).unwrap();
        let err = cluster
            .append(json!({"value": "SOFACY"}), false)
            .unwrap_err();
        assert!(matches!(err, CoreError::Duplicate(_)));
    }

    #[test]
    fn duplicate_append_is_logged_with_skip() {
        let mut cluster = Cluster::from_value(sample_record(), true).unwrap();
        cluster.append(json!({"value": "SOFACY"}), true).unwrap();
        assert_eq!(cluster.len(), 2);
        assert_eq!(
            cluster.duplicates(),
            &[("Threat Actor".to_string(), "SOFACY".to_string())]
        );
        // The index kept the first-seen entry.
        assert_eq!(cluster.get("sofacy").unwrap().value, "Sofacy");
    }

    #[test]
    fn search_matches_synonyms_in_index_order() {
        let cluster = Cluster::from_value(sample_record(), false).unwrap();
        let hits = cluster.search("bear");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "APT29");

        let all: Vec<&str> = cluster.search("a").iter().map(|v| v.value.as_str()).collect();
        assert_eq!(all, vec!["Sofacy", "APT29"]);
    }

    #[test]
    fn search_tags_returns_machinetags() {
        let cluster = Cluster::from_value(sample_record(), false).unwrap();
        assert_eq!(
            cluster.search_tags("sednit"),
            vec!["misp-galaxy:threat-actor=\"Sofacy\""]
        );
    }

    #[test]
    fn machinetags_cover_every_value() {
        let cluster = Cluster::from_value(sample_record(), false).unwrap();
        assert_eq!(
            cluster.machinetags(),
            vec![
                "misp-galaxy:threat-actor=\"Sofacy\"",
                "misp-galaxy:threat-actor=\"APT29\"",
            ]
        );
    }

    #[test]
    fn external_id_lookup_scans_additional_meta() {
        let mut cluster = Cluster::from_value(sample_record(), false).unwrap();
        cluster
            .append(
                json!({
                    "value": "Implant Internal Image - T1525",
                    "meta": {"external_id": "T1525"}
                }),
                false,
            )
            .unwrap();
        let hit = cluster.get_by_external_id("T1525").unwrap();
        assert_eq!(hit.value, "Implant Internal Image - T1525");

        let err = cluster.get_by_external_id("XXXXXX").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn kill_chain_tactics_are_grouped_sorted_and_deduped() {
        let mut cluster = Cluster::from_value(sample_record(), false).unwrap();
        cluster
            .append(
                json!({
                    "value": "a",
                    "meta": {"kill_chain": [
                        "enterprise-attack:Defense Evasion",
                        "enterprise-attack:Persistence"
                    ]}
                }),
                false,
            )
            .unwrap();
        cluster
            .append(
                json!({
                    "value": "b",
                    "meta": {"kill_chain": ["enterprise-attack:Defense Evasion"]}
                }),
                false,
            )
            .unwrap();

        let tactics = cluster.get_kill_chain_tactics();
        assert_eq!(tactics.len(), 1);
        assert_eq!(
            tactics["enterprise-attack"],
            vec!["Defense Evasion", "Persistence"]
        );
    }

    #[test]
    fn to_value_roundtrips_the_record() {
        let record = sample_record();
        let cluster = Cluster::from_value(record.clone(), false).unwrap();
        assert_eq!(cluster.to_value(), record);
        assert!(!cluster.has_changed());
    }

    #[test]
    fn has_changed_tracks_value_mutation() {
        let mut cluster = Cluster::from_value(sample_record(), false).unwrap();
        cluster.get_mut("apt29").unwrap().description = Some("edited".to_string());
        assert!(cluster.has_changed());
    }
}
