//! Core capability errors (record construction, tag parsing, lookups).
//!
//! These are bounded and stable: core errors represent domain/refusal
//! states, not library implementation details.

use std::fmt;

use thiserror::Error;

/// Which record family failed to construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Galaxy,
    Cluster,
    ClusterValue,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Galaxy => "galaxy",
            RecordKind::Cluster => "cluster",
            RecordKind::ClusterValue => "cluster value",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required field is missing or has the wrong shape at construction.
///
/// Fatal to that entity; a batch load aborts on the first one.
#[derive(Debug, Error, Clone)]
#[error("invalid {kind} record: {reason}")]
pub struct InvalidRecord {
    pub kind: RecordKind,
    pub reason: String,
}

impl InvalidRecord {
    pub fn new(kind: RecordKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Case-folded value already present in the cluster.
#[derive(Debug, Error, Clone)]
#[error("value `{value}` already present in cluster `{cluster}`")]
pub struct DuplicateValue {
    pub cluster: String,
    pub value: String,
}

/// Tag string does not match `namespace:type="value"`.
#[derive(Debug, Error, Clone)]
#[error("machinetag `{raw}` is malformed: {reason}")]
pub struct MalformedTag {
    pub raw: String,
    pub reason: &'static str,
}

/// Umbrella for machinetag reversal: parse failure, unknown type, or
/// unknown value all collapse to this one kind.
#[derive(Debug, Error, Clone)]
#[error("machinetag `{tag}` could not be reverted")]
pub struct UnableToRevertMachinetag {
    pub tag: String,
}

/// Named or external-ID lookup miss.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum NotFound {
    #[error("cluster `{cluster_type}` is not loaded")]
    Cluster { cluster_type: String },
    #[error("galaxy `{galaxy_type}` is not loaded")]
    Galaxy { galaxy_type: String },
    #[error("no value with external id `{id}` in cluster `{cluster}`")]
    ExternalId { cluster: String, id: String },
}

/// Canonical error enum for the core capability.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidRecord(#[from] InvalidRecord),
    #[error(transparent)]
    Duplicate(#[from] DuplicateValue),
    #[error(transparent)]
    MalformedTag(#[from] MalformedTag),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Revert(#[from] UnableToRevertMachinetag),
}
