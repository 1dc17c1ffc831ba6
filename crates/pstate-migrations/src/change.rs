//! Changes a model version makes to stored state
//!
//! Each change is an explicit tagged variant resolved when the model version
//! is declared. Every change is total: input it cannot make sense of is left
//! alone or given a default, never rejected.

use std::fmt;
use std::sync::Arc;

use pstate_model::{FieldPath, StateBlob};
use serde_json::{Map, Value};

/// Pure function computing top-level fields to write
pub type BackfillFn = Arc<dyn Fn(&StateBlob) -> Map<String, Value> + Send + Sync>;

/// One change within a model version
#[derive(Clone)]
pub enum ModelChange {
    /// Write computed fields (overwriting any existing value)
    DataBackfill {
        /// Human-readable summary for logs
        description: String,
        /// The backfill function
        backfill: BackfillFn,
    },

    /// Remove obsolete fields
    DataRemoval {
        /// Fields to drop
        fields: Vec<FieldPath>,
    },

    /// Move a value to a new path
    ///
    /// If the new path already holds a value, that value wins and the old
    /// field is dropped.
    FieldRename {
        /// Old location
        from: FieldPath,
        /// New location
        to: FieldPath,
    },

    /// Declare new optional fields; stored data is untouched
    MappingsAddition {
        /// Newly declared fields
        fields: Vec<FieldPath>,
    },
}

impl ModelChange {
    /// Backfill from a function
    pub fn data_backfill<F>(description: impl Into<String>, backfill: F) -> Self
    where
        F: Fn(&StateBlob) -> Map<String, Value> + Send + Sync + 'static,
    {
        Self::DataBackfill {
            description: description.into(),
            backfill: Arc::new(backfill),
        }
    }

    /// Backfill fixed defaults for top-level fields that are absent or `null`
    #[must_use]
    pub fn backfill_defaults(defaults: Vec<(String, Value)>) -> Self {
        let description = format!(
            "default {}",
            defaults
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self::data_backfill(description, move |state| {
            defaults
                .iter()
                .filter(|(key, _)| state.get(key).map_or(true, Value::is_null))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    }

    /// Apply this change
    #[must_use]
    pub fn apply(&self, mut state: StateBlob) -> StateBlob {
        match self {
            Self::DataBackfill { backfill, .. } => {
                for (key, value) in backfill(&state) {
                    state = state.with_field(key, value);
                }
                state
            }
            Self::DataRemoval { fields } => {
                for path in fields {
                    state.remove_path(path);
                }
                state
            }
            Self::FieldRename { from, to } => {
                if let Some(value) = state.remove_path(from) {
                    if !state.contains(to) {
                        state.set_path(to, value);
                    }
                }
                state
            }
            Self::MappingsAddition { .. } => state,
        }
    }

    /// Short description for logs
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::DataBackfill { description, .. } => format!("backfill: {description}"),
            Self::DataRemoval { fields } => format!("remove: {}", join_paths(fields)),
            Self::FieldRename { from, to } => format!("rename: {from} -> {to}"),
            Self::MappingsAddition { fields } => format!("add mappings: {}", join_paths(fields)),
        }
    }
}

fn join_paths(paths: &[FieldPath]) -> String {
    paths
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Debug for ModelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
