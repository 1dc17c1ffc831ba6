//! Kind definitions
//!
//! A kind bundles everything the protocol knows about one `type`: the
//! classification of its fields and the chain of model versions its stored
//! shape has gone through. Definitions are checked once when built.

use std::collections::HashSet;

use pstate_migrations::{ModelVersion, ModelVersionError, ModelVersionMap, SchemaViolation, ValidationMode};
use pstate_model::{FieldClass, FieldClassification, FieldPath, SchemaVersion, StateBlob};

/// A registered kind
#[derive(Debug, Clone)]
pub struct KindDefinition {
    kind: String,
    classification: FieldClassification,
    versions: ModelVersionMap,
}

impl KindDefinition {
    /// Start defining a kind
    #[inline]
    #[must_use]
    pub fn builder(kind: impl Into<String>) -> KindBuilder {
        KindBuilder {
            kind: kind.into(),
            classification: FieldClassification::new(),
            versions: Vec::new(),
        }
    }

    /// The `type` discriminator
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Field classification
    #[inline]
    #[must_use]
    pub fn classification(&self) -> &FieldClassification {
        &self.classification
    }

    /// Model version chain
    #[inline]
    #[must_use]
    pub fn versions(&self) -> &ModelVersionMap {
        &self.versions
    }

    /// Latest schema version
    #[inline]
    #[must_use]
    pub fn latest_version(&self) -> SchemaVersion {
        self.versions.latest()
    }

    /// Check a blob against one version's schema
    ///
    /// Versions without a schema for `mode` accept everything.
    ///
    /// # Errors
    /// Returns the field-level violations
    pub fn validate(
        &self,
        state: &StateBlob,
        version: SchemaVersion,
        mode: ValidationMode,
    ) -> Result<(), SchemaViolation> {
        let schema = self.versions.get(version).and_then(|v| match mode {
            ValidationMode::ForwardCompatibility => v.forward_compatibility(),
            ValidationMode::Create => v.create(),
        });
        match schema {
            Some(schema) => schema.validate(state, mode),
            None => Ok(()),
        }
    }

    /// Check a blob against the latest `create` schema, if one is declared
    ///
    /// # Errors
    /// Returns the field-level violations
    pub fn validate_for_create(&self, state: &StateBlob) -> Result<(), SchemaViolation> {
        self.validate(state, self.latest_version(), ValidationMode::Create)
    }

    /// Read a blob from a newer writer through the latest
    /// `forward_compatibility` schema, dropping undeclared fields
    #[must_use]
    pub fn prune_for_read(&self, state: StateBlob) -> StateBlob {
        match self
            .versions
            .get(self.latest_version())
            .and_then(ModelVersion::forward_compatibility)
        {
            Some(schema) => schema.prune_unknown(state),
            None => state,
        }
    }
}

/// Builder for [`KindDefinition`]
#[derive(Debug)]
pub struct KindBuilder {
    kind: String,
    classification: FieldClassification,
    versions: Vec<ModelVersion>,
}

impl KindBuilder {
    /// Classify a field
    #[must_use]
    pub fn field(mut self, path: FieldPath, class: FieldClass) -> Self {
        self.classification = self.classification.with(path, class);
        self
    }

    /// Declare a reference-holding field
    #[must_use]
    pub fn reference(self, path: FieldPath, name: &str, target_type: &str) -> Self {
        self.field(path, FieldClass::reference(name, target_type))
    }

    /// Declare a model version
    #[must_use]
    pub fn model_version(mut self, version: ModelVersion) -> Self {
        self.versions.push(version);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// Returns error if the kind name is empty or reserved, a field is
    /// classified twice, reference fields overlap or share a name, or the
    /// model versions are not contiguous
    pub fn build(self) -> Result<KindDefinition, KindError> {
        if self.kind.is_empty() {
            return Err(KindError::EmptyKind);
        }
        if self.kind == pstate_telemetry::UNKNOWN_KIND {
            return Err(KindError::ReservedKind(self.kind));
        }

        let mut seen = HashSet::new();
        for spec in self.classification.fields() {
            if !seen.insert(&spec.path) {
                return Err(KindError::DuplicateField {
                    kind: self.kind,
                    path: spec.path.to_string(),
                });
            }
        }

        let slots: Vec<_> = self.classification.reference_slots().collect();
        for (i, first) in slots.iter().enumerate() {
            for second in &slots[i + 1..] {
                if first.name == second.name {
                    return Err(KindError::DuplicateReferenceName {
                        kind: self.kind,
                        name: first.name.to_string(),
                    });
                }
                if first.path.overlaps(second.path) {
                    return Err(KindError::OverlappingReferences {
                        kind: self.kind,
                        first: first.path.to_string(),
                        second: second.path.to_string(),
                    });
                }
            }
        }

        let versions = ModelVersionMap::from_versions(self.versions).map_err(|source| {
            KindError::Versions {
                kind: self.kind.clone(),
                source,
            }
        })?;

        Ok(KindDefinition {
            kind: self.kind,
            classification: self.classification,
            versions,
        })
    }
}

/// Errors defining a kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KindError {
    /// The `type` discriminator is empty
    #[error("kind name cannot be empty")]
    EmptyKind,

    /// The name is used for telemetry of unregistered kinds
    #[error("kind name '{0}' is reserved")]
    ReservedKind(String),

    /// A field is classified twice
    #[error("'{kind}' classifies field {path} twice")]
    DuplicateField { kind: String, path: String },

    /// Two reference fields share a symbolic name
    #[error("'{kind}' declares reference name '{name}' twice")]
    DuplicateReferenceName { kind: String, name: String },

    /// One reference field is nested in another
    #[error("'{kind}' reference fields {first} and {second} overlap")]
    OverlappingReferences {
        kind: String,
        first: String,
        second: String,
    },

    /// The model version chain is invalid
    #[error("'{kind}' model versions: {source}")]
    Versions {
        kind: String,
        #[source]
        source: ModelVersionError,
    },
}
