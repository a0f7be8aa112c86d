//! Galaxy metadata records.

use std::fmt;

use serde_json::{Map, Value};

use crate::store::{DocumentStore, Kind};

use super::error::{CoreError, InvalidRecord, RecordKind};

/// Descriptive record for one logical grouping of clusters.
///
/// Pure metadata, no sub-entities.
#[derive(Clone, Debug)]
pub struct Galaxy {
    pub galaxy_type: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub version: Value,
    pub uuid: String,
    pub namespace: Option<String>,
    pub kill_chain_order: Option<Value>,
    original: Value,
}

impl Galaxy {
    /// Build a galaxy from one raw record. `type`, `name`, `icon`,
    /// `description`, `version` and `uuid` are mandatory.
    pub fn from_value(record: Value) -> Result<Self, CoreError> {
        let Value::Object(obj) = &record else {
            return Err(InvalidRecord::new(RecordKind::Galaxy, "record is not an object").into());
        };
        let galaxy = Self {
            galaxy_type: required_string(obj, "type")?,
            name: required_string(obj, "name")?,
            icon: required_string(obj, "icon")?,
            description: required_string(obj, "description")?,
            version: required_field(obj, "version")?,
            uuid: required_string(obj, "uuid")?,
            namespace: match obj.get("namespace") {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            },
            kill_chain_order: obj.get("kill_chain_order").cloned(),
            original: Value::Null,
        };
        Ok(Self {
            original: record,
            ..galaxy
        })
    }

    /// Load one galaxy by type name from the document store.
    pub fn from_store(store: &dyn DocumentStore, galaxy_type: &str) -> crate::Result<Self> {
        let record = store.load(Kind::Galaxies, galaxy_type)?;
        Ok(Self::from_value(record)?)
    }

    pub(crate) fn original(&self) -> &Value {
        &self.original
    }

    /// Re-emit the record, omitting absent optional fields.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::String(self.galaxy_type.clone()));
        out.insert("name".to_string(), Value::String(self.name.clone()));
        out.insert("icon".to_string(), Value::String(self.icon.clone()));
        out.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        out.insert("version".to_string(), self.version.clone());
        out.insert("uuid".to_string(), Value::String(self.uuid.clone()));
        if let Some(namespace) = &self.namespace {
            out.insert("namespace".to_string(), Value::String(namespace.clone()));
        }
        if let Some(kill_chain_order) = &self.kill_chain_order {
            out.insert("kill_chain_order".to_string(), kill_chain_order.clone());
        }
        Value::Object(out)
    }
}

impl fmt::Display for Galaxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.galaxy_type)
    }
}

fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String, InvalidRecord> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(InvalidRecord::new(
            RecordKind::Galaxy,
            format!("`{key}` is not a string"),
        )),
        None => Err(InvalidRecord::new(
            RecordKind::Galaxy,
            format!("`{key}` is missing"),
        )),
    }
}

fn required_field(obj: &Map<String, Value>, key: &str) -> Result<Value, InvalidRecord> {
    match obj.get(key) {
        Some(v) => Ok(v.clone()),
        None => Err(InvalidRecord::new(
            RecordKind::Galaxy,
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
            "type": "threat-actor",
            "name": "Threat Actor",
            "icon": "user-secret",
            "description": "Known or estimated adversary groups",
            "version": 3,
            "uuid": "698774c7-8022-42c4-917f-8d6e4f06ada3",
            "namespace": "misp"
        })
    }

    #[test]
    fn construction_requires_all_mandatory_fields() {
        for key in ["type", "name", "icon", "description", "version", "uuid"] {
            let mut record = sample_record();
            record.as_object_mut().unwrap().remove(key);
            assert!(Galaxy::from_value(record).is_err(), "{key}");
        }
        assert!(Galaxy::from_value(sample_record()).is_ok());
    }

    #[test]
    fn version_is_carried_uncoerced() {
        let mut record = sample_record();
        record.as_object_mut().unwrap()["version"] = json!("2.1");
        let galaxy = Galaxy::from_value(record).unwrap();
        assert_eq!(galaxy.version, json!("2.1"));
    }

    #[test]
    fn to_value_roundtrips_with_and_without_optionals() {
        let record = sample_record();
        assert_eq!(Galaxy::from_value(record.clone()).unwrap().to_value(), record);

        let mut bare = sample_record();
        bare.as_object_mut().unwrap().remove("namespace");
        assert_eq!(Galaxy::from_value(bare.clone()).unwrap().to_value(), bare);

        let mut ordered = sample_record();
        ordered.as_object_mut().unwrap().insert(
            "kill_chain_order".to_string(),
            json!(["reconnaissance", "delivery"]),
        );
        assert_eq!(
            Galaxy::from_value(ordered.clone()).unwrap().to_value(),
            ordered
        );
    }
}
