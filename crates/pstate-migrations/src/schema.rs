//! Schema gate at version boundaries
//!
//! Each model version may carry two JSON schemas over the blob's attributes:
//! - `forward_compatibility`: tolerant read shape; unknown top-level fields
//!   from newer writers are dropped before validation
//! - `create`: strict write shape; unknown top-level fields are rejected

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use pstate_model::StateBlob;
use serde_json::Value;

/// Which shape a blob is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Tolerate unknown fields from newer writers
    ForwardCompatibility,
    /// Exact shape for the current version
    Create,
}

/// A compiled JSON schema for a kind's attributes at one version
#[derive(Clone)]
pub struct StateSchema {
    source: Value,
    compiled: Arc<JSONSchema>,
    known_fields: Option<BTreeSet<String>>,
}

impl StateSchema {
    /// Compile a JSON schema
    ///
    /// # Errors
    /// Returns error if the schema itself is invalid
    pub fn compile(source: Value) -> Result<Self, SchemaError> {
        let compiled = JSONSchema::compile(&source).map_err(|e| SchemaError::Invalid(e.to_string()))?;
        let known_fields = source
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect());
        Ok(Self {
            source,
            compiled: Arc::new(compiled),
            known_fields,
        })
    }

    /// The schema document
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Drop top-level fields the schema does not declare
    ///
    /// Schemas without `properties` declare nothing and keep everything.
    #[must_use]
    pub fn prune_unknown(&self, state: StateBlob) -> StateBlob {
        let Some(known) = &self.known_fields else {
            return state;
        };
        let kind = state.kind().to_string();
        let fields = state
            .into_fields()
            .into_iter()
            .filter(|(key, _)| known.contains(key))
            .collect();
        StateBlob::from_parts(kind, fields)
    }

    /// Validate a blob's attributes
    ///
    /// # Errors
    /// Returns every field-level error found
    pub fn validate(&self, state: &StateBlob, mode: ValidationMode) -> Result<(), SchemaViolation> {
        let mut errors = Vec::new();

        let instance = match mode {
            ValidationMode::ForwardCompatibility => self.prune_unknown(state.clone()).attributes_value(),
            ValidationMode::Create => {
                if let Some(known) = &self.known_fields {
                    for key in state.fields().keys().filter(|key| !known.contains(*key)) {
                        errors.push(FieldError {
                            path: format!("/{key}"),
                            message: format!("unknown field '{key}'"),
                        });
                    }
                }
                state.attributes_value()
            }
        };

        if let Err(found) = self.compiled.validate(&instance) {
            errors.extend(found.map(|e| FieldError {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            }));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolation { errors })
        }
    }
}

impl fmt::Debug for StateSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// One field-level validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON pointer into the attributes
    pub path: String,
    /// What is wrong there
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A blob failed a schema check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", format_errors(.errors))]
pub struct SchemaViolation {
    /// Field-level errors, in discovery order
    pub errors: Vec<FieldError>,
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors building schemas
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    /// The schema document is not a valid JSON schema
    #[error("invalid schema: {0}")]
    Invalid(String),
}
