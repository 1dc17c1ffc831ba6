//! Per-kind field classification
//!
//! Every kind declares, once, what each of its known fields is. The same
//! classification drives reference extraction, reference injection and
//! usage telemetry, so the question "does this field identify something?"
//! has exactly one answer.

use std::collections::HashMap;

use crate::path::FieldPath;

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldClass {
    /// Concrete id of a foreign entity, moved into a [`crate::Reference`]
    Reference {
        /// Fixed symbolic reference name
        name: String,
        /// Kind of the referenced entity
        target_type: String,
    },

    /// User-entered text
    FreeText,

    /// Boolean switch
    Flag,

    /// String drawn from a closed set of values
    Enumerated {
        /// Values reported verbatim
        allowed: Vec<String>,
    },

    /// Array whose length is of interest
    Collection,

    /// Numeric setting
    Numeric,

    /// Never reported
    Opaque,
}

impl FieldClass {
    /// Reference class for a field
    #[inline]
    #[must_use]
    pub fn reference(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::Reference {
            name: name.into(),
            target_type: target_type.into(),
        }
    }

    /// Enumerated class from a static value list
    #[must_use]
    pub fn enumerated(allowed: &[&str]) -> Self {
        Self::Enumerated {
            allowed: allowed.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Whether the field identifies an entity or carries user content
    #[inline]
    #[must_use]
    pub fn is_identifying(&self) -> bool {
        matches!(self, Self::Reference { .. } | Self::FreeText)
    }
}

/// One classified field of a kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: FieldPath,
    pub class: FieldClass,
}

/// Reference-holding field, borrowed from a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSlot<'a> {
    pub path: &'a FieldPath,
    pub name: &'a str,
    pub target_type: &'a str,
}

/// The full field classification of one kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldClassification {
    fields: Vec<FieldSpec>,
}

impl FieldClassification {
    /// Create an empty classification
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classified field, returning the updated classification
    #[must_use]
    pub fn with(mut self, path: FieldPath, class: FieldClass) -> Self {
        self.fields.push(FieldSpec { path, class });
        self
    }

    /// All classified fields in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields holding foreign identifiers
    pub fn reference_slots(&self) -> impl Iterator<Item = ReferenceSlot<'_>> {
        self.fields.iter().filter_map(|spec| match &spec.class {
            FieldClass::Reference { name, target_type } => Some(ReferenceSlot {
                path: &spec.path,
                name,
                target_type,
            }),
            _ => None,
        })
    }

    /// Fields that may be reported in aggregate
    pub fn reportable(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|spec| !spec.class.is_identifying())
    }

    /// Class of the field at `path`, if classified
    #[must_use]
    pub fn class_of(&self, path: &FieldPath) -> Option<&FieldClass> {
        self.fields
            .iter()
            .find(|spec| &spec.path == path)
            .map(|spec| &spec.class)
    }

    /// Reference slot with the given symbolic name
    #[must_use]
    pub fn slot_named(&self, name: &str) -> Option<ReferenceSlot<'_>> {
        self.reference_slots().find(|slot| slot.name == name)
    }
}

/// Lookup of field classifications by kind
///
/// Resolved once when kinds are registered; callers never probe a kind for
/// capabilities at call time.
pub trait FieldCatalog: Send + Sync {
    /// Classification of `kind`, or `None` for unrecognized kinds
    fn classification(&self, kind: &str) -> Option<&FieldClassification>;
}

impl FieldCatalog for HashMap<String, FieldClassification> {
    fn classification(&self, kind: &str) -> Option<&FieldClassification> {
        self.get(kind)
    }
}
