//! Schema validation: the optional collaborator.
//!
//! Validation is a capability the runtime may or may not carry. With the
//! `schema-validation` feature the crate ships a `jsonschema`-backed
//! implementation; without it, [`default_validator`] returns `None` and
//! registry validation fails fast with [`SchemaError::Unavailable`]
//! rather than silently skipping.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("no schema validator is available; enable the `schema-validation` feature")]
    Unavailable,
    #[error("schema violation: {reason}")]
    Violation { reason: String },
}

/// Validates one record against one schema document, reporting the first
/// structural violation.
pub trait SchemaValidator {
    fn validate(&self, record: &Value, schema: &Value) -> Result<(), SchemaError>;
}

/// The validator compiled into this build, if any.
pub fn default_validator() -> Option<Box<dyn SchemaValidator>> {
    #[cfg(feature = "schema-validation")]
    {
        Some(Box::new(JsonSchemaValidator))
    }
    #[cfg(not(feature = "schema-validation"))]
    {
        None
    }
}

/// Draft validator backed by the `jsonschema` crate.
#[cfg(feature = "schema-validation")]
pub struct JsonSchemaValidator;

#[cfg(feature = "schema-validation")]
impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, record: &Value, schema: &Value) -> Result<(), SchemaError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| SchemaError::Violation {
            reason: format!("schema does not compile: {e}"),
        })?;
        validator
            .validate(record)
            .map_err(|e| SchemaError::Violation {
                reason: e.to_string(),
            })
    }
}
