//! Model versions
//!
//! A kind's stored shape evolves through contiguous model versions starting
//! at 1. Version `n` (for `n >= 2`) holds the changes that turn a version
//! `n - 1` blob into a version `n` blob, plus the schemas for version `n`.

use std::collections::BTreeMap;

use pstate_model::{FieldPath, SchemaVersion, StateBlob};

use crate::change::ModelChange;
use crate::schema::StateSchema;

/// One declared version of a kind
#[derive(Debug, Clone)]
pub struct ModelVersion {
    version: SchemaVersion,
    changes: Vec<ModelChange>,
    forward_compatibility: Option<StateSchema>,
    create: Option<StateSchema>,
}

impl ModelVersion {
    /// Declare a version with no changes or schemas yet
    #[inline]
    #[must_use]
    pub fn new(version: impl Into<SchemaVersion>) -> Self {
        Self {
            version: version.into(),
            changes: Vec::new(),
            forward_compatibility: None,
            create: None,
        }
    }

    /// Add a change
    #[inline]
    #[must_use]
    pub fn with_change(mut self, change: ModelChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Set the tolerant read schema
    #[inline]
    #[must_use]
    pub fn with_forward_compatibility(mut self, schema: StateSchema) -> Self {
        self.forward_compatibility = Some(schema);
        self
    }

    /// Set the strict write schema
    #[inline]
    #[must_use]
    pub fn with_create(mut self, schema: StateSchema) -> Self {
        self.create = Some(schema);
        self
    }

    /// The version this declares
    #[inline]
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Changes applied on the way into this version
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &[ModelChange] {
        &self.changes
    }

    /// Tolerant read schema, if declared
    #[inline]
    #[must_use]
    pub fn forward_compatibility(&self) -> Option<&StateSchema> {
        self.forward_compatibility.as_ref()
    }

    /// Strict write schema, if declared
    #[inline]
    #[must_use]
    pub fn create(&self) -> Option<&StateSchema> {
        self.create.as_ref()
    }

    /// Fields declared by `MappingsAddition` changes
    pub fn added_fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.changes.iter().flat_map(|change| match change {
            ModelChange::MappingsAddition { fields } => fields.as_slice(),
            _ => &[][..],
        })
    }

    /// Apply every change in declaration order
    #[must_use]
    pub fn apply(&self, state: StateBlob) -> StateBlob {
        self.changes.iter().fold(state, |state, change| change.apply(state))
    }
}

/// A single step of a migration chain
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep<'a> {
    /// Version the step starts from
    pub from_version: SchemaVersion,
    /// The version being migrated into
    pub model_version: &'a ModelVersion,
}

impl MigrationStep<'_> {
    /// Version the step produces
    #[inline]
    #[must_use]
    pub fn to_version(&self) -> SchemaVersion {
        self.model_version.version()
    }
}

/// All model versions of one kind, contiguous from 1
#[derive(Debug, Clone)]
pub struct ModelVersionMap {
    versions: BTreeMap<SchemaVersion, ModelVersion>,
}

impl ModelVersionMap {
    /// A kind that has never changed shape
    #[must_use]
    pub fn initial() -> Self {
        let mut versions = BTreeMap::new();
        versions.insert(SchemaVersion::INITIAL, ModelVersion::new(SchemaVersion::INITIAL));
        Self { versions }
    }

    /// Build from declared versions
    ///
    /// Version 1 is implied when not declared.
    ///
    /// # Errors
    /// Returns error on version 0, duplicates, gaps, or changes on version 1
    pub fn from_versions(
        declared: impl IntoIterator<Item = ModelVersion>,
    ) -> Result<Self, ModelVersionError> {
        let mut versions = BTreeMap::new();
        for model_version in declared {
            let version = model_version.version();
            if version.get() == 0 {
                return Err(ModelVersionError::ZeroVersion);
            }
            if version == SchemaVersion::INITIAL && !model_version.changes().is_empty() {
                return Err(ModelVersionError::InitialHasChanges);
            }
            if versions.insert(version, model_version).is_some() {
                return Err(ModelVersionError::Duplicate(version));
            }
        }

        versions
            .entry(SchemaVersion::INITIAL)
            .or_insert_with(|| ModelVersion::new(SchemaVersion::INITIAL));

        let mut expected = SchemaVersion::INITIAL;
        for version in versions.keys() {
            if *version != expected {
                return Err(ModelVersionError::Gap { missing: expected });
            }
            expected = expected.next();
        }

        Ok(Self { versions })
    }

    /// Highest declared version
    #[must_use]
    pub fn latest(&self) -> SchemaVersion {
        self.versions
            .keys()
            .next_back()
            .copied()
            .unwrap_or(SchemaVersion::INITIAL)
    }

    /// Look up one version
    #[inline]
    #[must_use]
    pub fn get(&self, version: SchemaVersion) -> Option<&ModelVersion> {
        self.versions.get(&version)
    }

    /// All versions, ascending
    pub fn iter(&self) -> impl Iterator<Item = &ModelVersion> {
        self.versions.values()
    }

    /// Steps covering `(from, to]`, or the first version without one
    ///
    /// # Errors
    /// Returns the first missing version
    pub fn steps(
        &self,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> Result<Vec<MigrationStep<'_>>, SchemaVersion> {
        let mut steps = Vec::new();
        let mut current = from;
        for version in SchemaVersion::range_after(from, to) {
            let model_version = self.versions.get(&version).ok_or(version)?;
            steps.push(MigrationStep {
                from_version: current,
                model_version,
            });
            current = version;
        }
        Ok(steps)
    }
}

impl Default for ModelVersionMap {
    fn default() -> Self {
        Self::initial()
    }
}

/// Errors declaring model versions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelVersionError {
    /// Versions start at 1
    #[error("model version 0 is not allowed")]
    ZeroVersion,

    /// The same version was declared twice
    #[error("model version {0} declared twice")]
    Duplicate(SchemaVersion),

    /// Versions are not contiguous
    #[error("model versions are not contiguous: version {missing} is missing")]
    Gap { missing: SchemaVersion },

    /// The initial version cannot transform anything
    #[error("model version 1 cannot declare changes")]
    InitialHasChanges,
}
