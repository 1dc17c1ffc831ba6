//! Saved search panels

use pstate_model::FieldClass;

use super::{field, SEARCH};
use crate::kind::KindDefinition;
use crate::registry::RegistryError;

/// Saved search embeddable
pub const SEARCH_EMBEDDABLE: &str = "search-embeddable";

pub(super) fn search_embeddable() -> Result<KindDefinition, RegistryError> {
    Ok(KindDefinition::builder(SEARCH_EMBEDDABLE)
        .reference(field("savedSearchId")?, "savedSearchRef", SEARCH)
        .field(field("title")?, FieldClass::FreeText)
        .field(field("description")?, FieldClass::FreeText)
        .field(field("columns")?, FieldClass::Collection)
        .field(field("sort")?, FieldClass::Collection)
        .field(field("rowHeight")?, FieldClass::Numeric)
        .field(field("sampleSize")?, FieldClass::Numeric)
        .field(field("viewMode")?, FieldClass::enumerated(&["documents", "aggregated"]))
        .build()?)
}
