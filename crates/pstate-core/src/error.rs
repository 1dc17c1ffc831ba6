//! Error types for the save/load service
//!
//! Storage and migration failures are wrapped with `#[from]` so callers can
//! match on the cause. [`LoadError::user_message`] is the only text meant
//! for end users.

use pstate_migrations::{MigrationError, SchemaViolation};
use pstate_model::SchemaVersion;

use crate::store::StoreError;

/// Message shown to end users for any load failure
pub const LOAD_FAILURE_MESSAGE: &str = "this saved item could not be loaded";

/// Errors saving state
#[derive(Debug, Clone, thiserror::Error)]
pub enum SaveError {
    /// The state does not match the kind's current shape
    #[error("'{kind}' state rejected: {violation}")]
    Validation {
        kind: String,
        #[source]
        violation: SchemaViolation,
    },

    /// The store refused the write
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors loading state
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The record could not be read
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The record could not be brought to the current version
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// A record from a newer version does not fit the current read shape
    #[error("'{kind}' written at version {written} does not fit version {latest}: {violation}")]
    Incompatible {
        kind: String,
        written: SchemaVersion,
        latest: SchemaVersion,
        #[source]
        violation: SchemaViolation,
    },
}

impl LoadError {
    /// Text safe to show an end user
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILURE_MESSAGE
    }

    /// Whether the record simply does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}
