//! One taxonomy entry within a cluster.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};

use super::error::{CoreError, InvalidRecord, RecordKind};
use super::meta::ClusterValueMeta;

/// Typed cross-reference to another cluster value, by destination UUID.
///
/// Extra keys on the record (tags and the like) are carried verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct RelatedValue {
    pub dest_uuid: String,
    pub relation_type: String,
    pub extra: Map<String, Value>,
}

impl RelatedValue {
    pub fn from_value(record: &Value) -> Result<Self, InvalidRecord> {
        let Value::Object(obj) = record else {
            return Err(InvalidRecord::new(
                RecordKind::ClusterValue,
                "related entry is not an object",
            ));
        };
        let mut extra = obj.clone();
        let dest_uuid = match extra.remove("dest-uuid") {
            Some(Value::String(s)) => s,
            _ => {
                return Err(InvalidRecord::new(
                    RecordKind::ClusterValue,
                    "related entry is missing `dest-uuid`",
                ));
            }
        };
        let relation_type = match extra.remove("type") {
            Some(Value::String(s)) => s,
            _ => {
                return Err(InvalidRecord::new(
                    RecordKind::ClusterValue,
                    "related entry is missing `type`",
                ));
            }
        };
        Ok(Self {
            dest_uuid,
            relation_type,
            extra,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("dest-uuid".to_string(), Value::String(self.dest_uuid.clone()));
        out.insert("type".to_string(), Value::String(self.relation_type.clone()));
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// One tagged value: identity is `value`, scoped to the owning cluster.
///
/// Holds the raw record it was constructed from so [`has_changed`]
/// can compare the live fields against the loaded state.
///
/// [`has_changed`]: ClusterValue::has_changed
#[derive(Clone, Debug)]
pub struct ClusterValue {
    pub value: String,
    pub uuid: Option<String>,
    pub description: Option<String>,
    pub meta: Option<ClusterValueMeta>,
    pub related: Vec<RelatedValue>,
    searchable: BTreeSet<String>,
    original: Value,
}

impl ClusterValue {
    pub fn from_value(record: Value) -> Result<Self, CoreError> {
        let Value::Object(obj) = &record else {
            return Err(
                InvalidRecord::new(RecordKind::ClusterValue, "record is not an object").into(),
            );
        };
        let value = match obj.get("value") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(InvalidRecord::new(
                    RecordKind::ClusterValue,
                    "`value` is missing or empty",
                )
                .into());
            }
        };
        let uuid = optional_string(obj, "uuid")?;
        let description = optional_string(obj, "description")?;
        let meta = match obj.get("meta") {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) if m.is_empty() => None,
            Some(Value::Object(m)) => Some(ClusterValueMeta::from_map(m.clone())),
            Some(_) => {
                return Err(
                    InvalidRecord::new(RecordKind::ClusterValue, "`meta` is not an object").into(),
                );
            }
        };
        let related = match obj.get("related") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(RelatedValue::from_value)
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(
                    InvalidRecord::new(RecordKind::ClusterValue, "`related` is not a list").into(),
                );
            }
        };
        let searchable = searchable_set(&value, uuid.as_deref(), meta.as_ref());
        Ok(Self {
            value,
            uuid,
            description,
            meta,
            related,
            searchable,
            original: record,
        })
    }

    /// Lowercased strings this value matches against during search:
    /// value, uuid, and synonyms, duplicates collapsed. Never used for
    /// identity.
    pub fn searchable(&self) -> &BTreeSet<String> {
        &self.searchable
    }

    /// Case-insensitive substring containment against the searchable
    /// set. `query` must already be lowercased.
    pub(crate) fn matches(&self, query: &str) -> bool {
        self.searchable.iter().any(|s| s.contains(query))
    }

    /// Fold `other` into this value in place.
    ///
    /// `value` and `description` are fully replaced. `related` entries
    /// are matched by destination UUID: entries only in `other` are
    /// added, common entries take `other`'s relation type, entries only
    /// in `self` stay untouched.
    pub fn merge(&mut self, other: &ClusterValue) {
        self.value = other.value.clone();
        self.description = other.description.clone();
        for theirs in &other.related {
            match self
                .related
                .iter_mut()
                .find(|ours| ours.dest_uuid == theirs.dest_uuid)
            {
                Some(ours) => ours.relation_type = theirs.relation_type.clone(),
                None => self.related.push(theirs.clone()),
            }
        }
        self.searchable = searchable_set(&self.value, self.uuid.as_deref(), self.meta.as_ref());
    }

    /// Whether the live fields differ from the record this value was
    /// constructed from.
    pub fn has_changed(&self) -> bool {
        self.to_value() != self.original
    }

    pub(crate) fn original(&self) -> &Value {
        &self.original
    }

    /// Re-emit the record, omitting absent fields.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("value".to_string(), Value::String(self.value.clone()));
        if let Some(uuid) = &self.uuid {
            out.insert("uuid".to_string(), Value::String(uuid.clone()));
        }
        if let Some(description) = &self.description {
            out.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(meta) = &self.meta {
            out.insert("meta".to_string(), Value::Object(meta.to_map()));
        }
        if !self.related.is_empty() {
            out.insert(
                "related".to_string(),
                Value::Array(self.related.iter().map(RelatedValue::to_value).collect()),
            );
        }
        Value::Object(out)
    }
}

impl fmt::Display for ClusterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(description) = &self.description {
            write!(f, "\n{description}")?;
        }
        Ok(())
    }
}

fn searchable_set(
    value: &str,
    uuid: Option<&str>,
    meta: Option<&ClusterValueMeta>,
) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    set.insert(value.to_lowercase());
    if let Some(uuid) = uuid {
        set.insert(uuid.to_lowercase());
    }
    if let Some(meta) = meta {
        for synonym in meta.synonym_strings() {
            set.insert(synonym.to_lowercase());
        }
    }
    set
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, InvalidRecord> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(InvalidRecord::new(
            RecordKind::ClusterValue,
            format!("`{key}` is not a string"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn construction_requires_a_non_empty_value() {
        assert!(ClusterValue::from_value(json!({"value": "APT28"})).is_ok());
        assert!(ClusterValue::from_value(json!({"value": ""})).is_err());
        assert!(ClusterValue::from_value(json!({"description": "no value"})).is_err());
        assert!(ClusterValue::from_value(json!("not an object")).is_err());
    }

    #[test]
    fn searchable_collects_value_uuid_and_synonyms() {
        let cv = ClusterValue::from_value(json!({
            "value": "Sofacy",
            "uuid": "5b4ee3ea-eee3-4c8e-8323-85ae32658754",
            "meta": {"synonyms": ["APT 28", "Sednit", "Sofacy"]}
        }))
        .unwrap();
        let searchable = cv.searchable();
        assert!(searchable.contains("sofacy"));
        assert!(searchable.contains("apt 28"));
        assert!(searchable.contains("sednit"));
        assert!(searchable.contains("5b4ee3ea-eee3-4c8e-8323-85ae32658754"));
        // "Sofacy" the synonym collapses into "sofacy" the value.
        assert_eq!(searchable.len(), 4);
    }

    #[test]
    fn to_value_omits_absent_fields() {
        let record = json!({"value": "APT29"});
        let cv = ClusterValue::from_value(record.clone()).unwrap();
        assert_eq!(cv.to_value(), record);
    }

    #[test]
    fn related_extra_keys_survive_the_roundtrip() {
        let record = json!({
            "value": "Turla",
            "related": [
                {"dest-uuid": "abc", "type": "similar", "tags": ["estimative-language:likelihood-probability=\"likely\""]}
            ]
        });
        let cv = ClusterValue::from_value(record.clone()).unwrap();
        assert_eq!(cv.to_value(), record);
    }

    #[test]
    fn merge_replaces_scalars_and_merges_related_by_uuid() {
        let mut cv1 = ClusterValue::from_value(json!({
            "value": "old",
            "related": [
                {"dest-uuid": "1", "type": "A"},
                {"dest-uuid": "2", "type": "B"}
            ]
        }))
        .unwrap();
        let cv2 = ClusterValue::from_value(json!({
            "value": "new",
            "related": [
                {"dest-uuid": "2", "type": "C"},
                {"dest-uuid": "3", "type": "D"}
            ]
        }))
        .unwrap();

        cv1.merge(&cv2);
        assert_eq!(cv1.value, "new");
        let types: Vec<(&str, &str)> = cv1
            .related
            .iter()
            .map(|r| (r.dest_uuid.as_str(), r.relation_type.as_str()))
            .collect();
        assert_eq!(types, vec![("1", "A"), ("2", "C"), ("3", "D")]);
    }

    #[test]
    fn merge_updates_the_searchable_set() {
        let mut cv1 = ClusterValue::from_value(json!({"value": "old"})).unwrap();
        let cv2 = ClusterValue::from_value(json!({"value": "new"})).unwrap();
        cv1.merge(&cv2);
        assert!(cv1.matches("new"));
        assert!(!cv1.matches("old"));
    }

    #[test]
    fn has_changed_tracks_in_place_edits() {
        let mut cv = ClusterValue::from_value(json!({
            "value": "Emotet",
            "description": "banking trojan"
        }))
        .unwrap();
        assert!(!cv.has_changed());
        cv.description = Some("loader".to_string());
        assert!(cv.has_changed());
    }
}
