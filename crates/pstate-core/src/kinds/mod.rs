//! Built-in kinds
//!
//! The UI entities shipped with the protocol. Each module returns fully
//! validated [`KindDefinition`]s; [`crate::KindRegistry::with_builtin_kinds`]
//! registers all of them.

mod controls;
mod rule;
mod search;

use pstate_migrations::StateSchema;
use pstate_model::FieldPath;
use serde_json::Value;

use crate::kind::KindDefinition;
use crate::registry::RegistryError;

pub use controls::{OPTIONS_LIST, RANGE_SLIDER, TIME_SLIDER};
pub use rule::RULE;
pub use search::SEARCH_EMBEDDABLE;

/// Target type of data view references
pub const INDEX_PATTERN: &str = "index-pattern";

/// Target type of saved search references
pub const SEARCH: &str = "search";

/// Every built-in kind
///
/// # Errors
/// Returns error if a built-in definition is invalid
pub fn builtin() -> Result<Vec<KindDefinition>, RegistryError> {
    Ok(vec![
        controls::options_list()?,
        controls::range_slider()?,
        controls::time_slider()?,
        search::search_embeddable()?,
        rule::rule()?,
    ])
}

fn field(path: &str) -> Result<FieldPath, RegistryError> {
    Ok(path.parse()?)
}

fn schema(source: Value) -> Result<StateSchema, RegistryError> {
    Ok(StateSchema::compile(source)?)
}
