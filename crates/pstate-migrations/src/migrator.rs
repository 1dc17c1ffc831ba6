//! Forward migration of stored state
//!
//! Applies a kind's model versions in order over `(from, to]`, checking the
//! result of each step against that version's `forward_compatibility`
//! schema. Any failure aborts the whole migration; no partially migrated
//! state is ever returned.

use std::collections::HashMap;
use std::fmt;

use pstate_model::{SchemaVersion, StateBlob};

use crate::model_version::{MigrationStep, ModelVersionMap};
use crate::schema::{SchemaViolation, ValidationMode};

/// Lookup of model versions by kind
pub trait MigrationCatalog: Send + Sync {
    /// Model versions of `kind`, or `None` for unrecognized kinds
    fn model_versions(&self, kind: &str) -> Option<&ModelVersionMap>;
}

impl MigrationCatalog for HashMap<String, ModelVersionMap> {
    fn model_versions(&self, kind: &str) -> Option<&ModelVersionMap> {
        self.get(kind)
    }
}

/// Errors during migration
#[derive(Debug, Clone, thiserror::Error)]
pub enum MigrationError {
    /// Target version is older than the source
    #[error("cannot downgrade '{kind}' from version {from} to {to}")]
    Downgrade {
        kind: String,
        from: SchemaVersion,
        to: SchemaVersion,
    },

    /// No model versions are registered for the kind
    #[error("no migrations registered for unrecognized type '{kind}'")]
    UnknownType { kind: String },

    /// The chain has no step into `missing`
    #[error("'{kind}' has no migration into version {missing} (latest is {latest})")]
    MissingStep {
        kind: String,
        missing: SchemaVersion,
        latest: SchemaVersion,
    },

    /// A step produced state its version's schema rejects
    #[error("'{kind}' failed validation at version {version}: {violation}")]
    SchemaViolation {
        kind: String,
        version: SchemaVersion,
        #[source]
        violation: SchemaViolation,
    },
}

/// Migrates blobs between schema versions
#[derive(Clone, Copy)]
pub struct VersionMigrator<'a> {
    catalog: &'a dyn MigrationCatalog,
    validate_boundaries: bool,
}

impl<'a> VersionMigrator<'a> {
    /// Create a migrator over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: &'a dyn MigrationCatalog) -> Self {
        Self {
            catalog,
            validate_boundaries: true,
        }
    }

    /// Whether each step's output is checked against its schema
    #[inline]
    #[must_use]
    pub fn validate_boundaries(mut self, validate: bool) -> Self {
        self.validate_boundaries = validate;
        self
    }

    /// Latest version of a kind
    #[must_use]
    pub fn latest_version(&self, kind: &str) -> Option<SchemaVersion> {
        self.catalog.model_versions(kind).map(ModelVersionMap::latest)
    }

    /// Steps that would run for `(from, to]`
    ///
    /// # Errors
    /// Returns error on downgrade, unknown kind or a gap in the chain
    pub fn plan(
        &self,
        kind: &str,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> Result<Vec<MigrationStep<'a>>, MigrationError> {
        if from > to {
            return Err(MigrationError::Downgrade {
                kind: kind.to_string(),
                from,
                to,
            });
        }
        if from == to {
            return Ok(Vec::new());
        }

        let versions = self
            .catalog
            .model_versions(kind)
            .ok_or_else(|| MigrationError::UnknownType {
                kind: kind.to_string(),
            })?;

        versions
            .steps(from, to)
            .map_err(|missing| MigrationError::MissingStep {
                kind: kind.to_string(),
                missing,
                latest: versions.latest(),
            })
    }

    /// Migrate `state` from `from` to `to`
    ///
    /// `from == to` returns the input untouched.
    ///
    /// # Errors
    /// Returns error on downgrade, unknown kind, a gap in the chain, or a
    /// schema violation at any step
    pub fn migrate(
        &self,
        state: StateBlob,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> Result<StateBlob, MigrationError> {
        if from == to {
            return Ok(state);
        }

        let kind = state.kind().to_string();
        let steps = self.plan(&kind, from, to)?;

        let mut state = state;
        for step in steps {
            state = step.model_version.apply(state);
            tracing::debug!(
                kind = %kind,
                from = %step.from_version,
                to = %step.to_version(),
                changes = step.model_version.changes().len(),
                "applied migration step"
            );

            if !self.validate_boundaries {
                continue;
            }
            if let Some(schema) = step.model_version.forward_compatibility() {
                schema
                    .validate(&state, ValidationMode::ForwardCompatibility)
                    .map_err(|violation| MigrationError::SchemaViolation {
                        kind: kind.clone(),
                        version: step.to_version(),
                        violation,
                    })?;
            }
        }

        Ok(state)
    }

    /// Migrate to the kind's latest version
    ///
    /// Returns the migrated state and the version it is now at. Unknown
    /// kinds are returned unchanged at `from`.
    ///
    /// # Errors
    /// Same as [`Self::migrate`]; a `from` newer than latest is not an error
    /// here and returns the input unchanged
    pub fn migrate_to_latest(
        &self,
        state: StateBlob,
        from: SchemaVersion,
    ) -> Result<(StateBlob, SchemaVersion), MigrationError> {
        match self.latest_version(state.kind()) {
            Some(latest) if latest > from => {
                let migrated = self.migrate(state, from, latest)?;
                Ok((migrated, latest))
            }
            _ => Ok((state, from)),
        }
    }
}

impl fmt::Debug for VersionMigrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionMigrator")
            .field("validate_boundaries", &self.validate_boundaries)
            .finish_non_exhaustive()
    }
}
