//! References to foreign saved objects
//!
//! A [`Reference`] is stored next to a sanitized blob and names the concrete
//! id that was pulled out of it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Symbolic pointer from a state blob to a foreign entity
///
/// `name` is fixed per field, so repeated saves of the same field always
/// produce the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Symbolic name, unique within one blob's reference set
    pub name: String,

    /// Kind of the referenced entity (e.g. `index-pattern`)
    #[serde(rename = "type")]
    pub target_type: String,

    /// Concrete foreign identifier
    pub id: String,
}

impl Reference {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            id: id.into(),
        }
    }
}

/// Find the first reference with the given name
#[must_use]
pub fn find_reference<'a>(references: &'a [Reference], name: &str) -> Option<&'a Reference> {
    references.iter().find(|r| r.name == name)
}

/// Names that appear more than once, in first-seen order
#[must_use]
pub fn duplicate_names(references: &[Reference]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for reference in references {
        let name = reference.name.as_str();
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}
