//! Cluster value metadata.
//!
//! A semi-structured bag: a fixed set of recognized keys plus whatever
//! else the record carried, retained verbatim as additional properties.

use serde_json::{Map, Value};

/// Recognized metadata keys, in the order they are re-emitted.
const RECOGNIZED_KEYS: [&str; 16] = [
    "type",
    "complexity",
    "effectiveness",
    "country",
    "possible_issues",
    "colour",
    "motive",
    "impact",
    "refs",
    "synonyms",
    "derivated_from",
    "status",
    "date",
    "encryption",
    "extensions",
    "ransomnotes",
];

/// Metadata attached to one [`ClusterValue`](super::ClusterValue).
///
/// Construction destructively extracts the recognized keys from the raw
/// map; the remainder stays in `additional`. The two key sets are
/// disjoint by construction, so re-serialization cannot duplicate keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterValueMeta {
    pub meta_type: Option<Value>,
    pub complexity: Option<Value>,
    pub effectiveness: Option<Value>,
    pub country: Option<Value>,
    pub possible_issues: Option<Value>,
    pub colour: Option<Value>,
    pub motive: Option<Value>,
    pub impact: Option<Value>,
    pub refs: Option<Value>,
    pub synonyms: Option<Value>,
    pub derivated_from: Option<Value>,
    pub status: Option<Value>,
    pub date: Option<Value>,
    pub encryption: Option<Value>,
    pub extensions: Option<Value>,
    pub ransomnotes: Option<Value>,
    pub additional: Map<String, Value>,
}

impl ClusterValueMeta {
    pub fn from_map(mut m: Map<String, Value>) -> Self {
        Self {
            meta_type: m.remove("type"),
            complexity: m.remove("complexity"),
            effectiveness: m.remove("effectiveness"),
            country: m.remove("country"),
            possible_issues: m.remove("possible_issues"),
            colour: m.remove("colour"),
            motive: m.remove("motive"),
            impact: m.remove("impact"),
            refs: m.remove("refs"),
            synonyms: m.remove("synonyms"),
            derivated_from: m.remove("derivated_from"),
            status: m.remove("status"),
            date: m.remove("date"),
            encryption: m.remove("encryption"),
            extensions: m.remove("extensions"),
            ransomnotes: m.remove("ransomnotes"),
            additional: m,
        }
    }

    /// Re-emit the recognized fields that are non-empty, merged with all
    /// additional properties.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, field) in RECOGNIZED_KEYS.iter().zip(self.recognized_fields()) {
            if let Some(value) = field
                && !is_empty(value)
            {
                out.insert((*key).to_string(), value.clone());
            }
        }
        for (key, value) in &self.additional {
            out.insert(key.clone(), value.clone());
        }
        out
    }

    /// Synonym strings, for the searchable set.
    ///
    /// Non-string entries (a handful of numeric synonyms exist in the
    /// corpus) are rendered through their JSON form.
    pub fn synonym_strings(&self) -> Vec<String> {
        match &self.synonyms {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn recognized_fields(&self) -> [&Option<Value>; 16] {
        [
            &self.meta_type,
            &self.complexity,
            &self.effectiveness,
            &self.country,
            &self.possible_issues,
            &self.colour,
            &self.motive,
            &self.impact,
            &self.refs,
            &self.synonyms,
            &self.derivated_from,
            &self.status,
            &self.date,
            &self.encryption,
            &self.extensions,
            &self.ransomnotes,
        ]
    }
}

/// Null, `""`, `[]` and `{}` count as empty; numbers and booleans do not.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
