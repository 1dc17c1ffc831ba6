//! Reference extraction (save path)
//!
//! Pulls concrete foreign ids out of a blob and replaces them with entries in
//! a sibling reference list.

use std::fmt;

use pstate_model::{FieldCatalog, Reference, StateBlob};
use serde_json::Value;

use crate::warning::ProtocolWarning;

/// Result of [`ReferenceExtractor::extract`]
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Sanitized state, with every extracted field removed
    pub state: StateBlob,
    /// One reference per extracted field
    pub references: Vec<Reference>,
    /// Everything tolerated along the way
    pub warnings: Vec<ProtocolWarning>,
}

impl Extracted {
    /// Split into the pair that gets persisted
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (StateBlob, Vec<Reference>) {
        (self.state, self.references)
    }
}

/// Extracts references according to each kind's field classification
#[derive(Clone, Copy)]
pub struct ReferenceExtractor<'a> {
    catalog: &'a dyn FieldCatalog,
    warn_on_unknown_type: bool,
}

impl<'a> ReferenceExtractor<'a> {
    /// Create an extractor over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: &'a dyn FieldCatalog) -> Self {
        Self {
            catalog,
            warn_on_unknown_type: true,
        }
    }

    /// Whether unrecognized kinds are logged
    ///
    /// The warning is returned in [`Extracted::warnings`] either way.
    #[inline]
    #[must_use]
    pub fn warn_on_unknown_type(mut self, warn: bool) -> Self {
        self.warn_on_unknown_type = warn;
        self
    }

    /// Extract references from `state`
    ///
    /// Never fails. Unrecognized kinds pass through with no references;
    /// absent or `null` reference fields are skipped.
    #[must_use]
    pub fn extract(&self, mut state: StateBlob) -> Extracted {
        let mut references = Vec::new();
        let mut warnings = Vec::new();

        let Some(classification) = self.catalog.classification(state.kind()) else {
            let warning = ProtocolWarning::UnrecognizedType {
                kind: state.kind().to_string(),
            };
            if self.warn_on_unknown_type {
                warning.log();
            }
            warnings.push(warning);
            return Extracted {
                state,
                references,
                warnings,
            };
        };

        for slot in classification.reference_slots() {
            match state.get_path(slot.path) {
                None | Some(Value::Null) => {}
                Some(Value::String(_)) => {
                    if let Some(Value::String(id)) = state.remove_path(slot.path) {
                        references.push(Reference::new(slot.name, slot.target_type, id));
                    }
                }
                Some(_) => {
                    let warning = ProtocolWarning::MalformedField {
                        kind: state.kind().to_string(),
                        path: slot.path.to_string(),
                    };
                    warning.log();
                    warnings.push(warning);
                }
            }
        }

        tracing::debug!(
            kind = state.kind(),
            references = references.len(),
            "extracted references"
        );

        Extracted {
            state,
            references,
            warnings,
        }
    }
}

impl fmt::Debug for ReferenceExtractor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceExtractor")
            .field("warn_on_unknown_type", &self.warn_on_unknown_type)
            .finish_non_exhaustive()
    }
}
