//! Kind registry
//!
//! Maps each `type` to its [`KindDefinition`]. Immutable once built and
//! shared by reference, so every protocol component sees the same
//! classification and version chain.

use std::collections::HashMap;

use pstate_migrations::{MigrationCatalog, ModelVersionMap, SchemaError, VersionMigrator};
use pstate_model::{FieldCatalog, FieldClassification, PathError};
use pstate_references::{ReferenceExtractor, ReferenceInjector};
use pstate_telemetry::TelemetryReducer;

use crate::config::ProtocolConfig;
use crate::kind::{KindDefinition, KindError};
use crate::kinds;

/// Registry of known kinds
#[derive(Debug, Default, Clone)]
pub struct KindRegistry {
    kinds: HashMap<String, KindDefinition>,
}

impl KindRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in kind
    ///
    /// # Errors
    /// Returns error if a built-in definition is invalid
    pub fn with_builtin_kinds() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for kind in kinds::builtin()? {
            registry.register(kind)?;
        }
        Ok(registry)
    }

    /// Register a kind
    ///
    /// # Errors
    /// Returns error if the kind is already registered
    pub fn register(&mut self, kind: KindDefinition) -> Result<(), RegistryError> {
        if self.kinds.contains_key(kind.kind()) {
            return Err(RegistryError::DuplicateKind(kind.kind().to_string()));
        }
        tracing::debug!(
            kind = kind.kind(),
            latest = %kind.latest_version(),
            references = kind.classification().reference_slots().count(),
            "registered kind"
        );
        self.kinds.insert(kind.kind().to_string(), kind);
        Ok(())
    }

    /// Look up a kind
    #[inline]
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&KindDefinition> {
        self.kinds.get(kind)
    }

    /// Whether a kind is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Extractor configured from `config`
    #[must_use]
    pub fn extractor(&self, config: &ProtocolConfig) -> ReferenceExtractor<'_> {
        ReferenceExtractor::new(self).warn_on_unknown_type(config.references.warn_on_unknown_type)
    }

    /// Injector configured from `config`
    #[must_use]
    pub fn injector(&self, config: &ProtocolConfig) -> ReferenceInjector<'_> {
        ReferenceInjector::new(self).warn_on_unknown_type(config.references.warn_on_unknown_type)
    }

    /// Migrator configured from `config`
    #[must_use]
    pub fn migrator(&self, config: &ProtocolConfig) -> VersionMigrator<'_> {
        VersionMigrator::new(self).validate_boundaries(config.migrations.validate_boundaries)
    }

    /// Telemetry reducer configured from `config`
    #[must_use]
    pub fn reducer(&self, config: &ProtocolConfig) -> TelemetryReducer<'_> {
        TelemetryReducer::new(self).include_unknown_kinds(config.telemetry.include_unknown_kinds)
    }
}

impl FieldCatalog for KindRegistry {
    fn classification(&self, kind: &str) -> Option<&FieldClassification> {
        self.get(kind).map(KindDefinition::classification)
    }
}

impl MigrationCatalog for KindRegistry {
    fn model_versions(&self, kind: &str) -> Option<&ModelVersionMap> {
        self.get(kind).map(KindDefinition::versions)
    }
}

/// Errors building a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The kind is already registered
    #[error("kind '{0}' is already registered")]
    DuplicateKind(String),

    /// A kind definition is invalid
    #[error(transparent)]
    Kind(#[from] KindError),

    /// A declared schema does not compile
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// A declared field path is malformed
    #[error("invalid field path: {0}")]
    Path(#[from] PathError),
}
