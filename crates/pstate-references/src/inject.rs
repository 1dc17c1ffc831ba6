//! Reference injection (load path)
//!
//! Writes resolved ids back into the fields they were extracted from.

use std::fmt;

use pstate_model::{duplicate_names, find_reference, FieldCatalog, Reference, StateBlob};
use serde_json::Value;

use crate::warning::ProtocolWarning;

/// Result of [`ReferenceInjector::inject_with_report`]
#[derive(Debug, Clone, PartialEq)]
pub struct Injected {
    /// State with every matching reference written back
    pub state: StateBlob,
    /// Everything tolerated along the way
    pub warnings: Vec<ProtocolWarning>,
}

/// Injects references according to each kind's field classification
#[derive(Clone, Copy)]
pub struct ReferenceInjector<'a> {
    catalog: &'a dyn FieldCatalog,
    warn_on_unknown_type: bool,
}

impl<'a> ReferenceInjector<'a> {
    /// Create an injector over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: &'a dyn FieldCatalog) -> Self {
        Self {
            catalog,
            warn_on_unknown_type: true,
        }
    }

    /// Whether unrecognized kinds are logged
    #[inline]
    #[must_use]
    pub fn warn_on_unknown_type(mut self, warn: bool) -> Self {
        self.warn_on_unknown_type = warn;
        self
    }

    /// Inject `references` into `state`
    ///
    /// Never fails. A missing reference leaves its field absent; unknown
    /// names are ignored.
    #[inline]
    #[must_use]
    pub fn inject(&self, state: StateBlob, references: &[Reference]) -> StateBlob {
        self.inject_with_report(state, references).state
    }

    /// Inject and report what was tolerated
    #[must_use]
    pub fn inject_with_report(&self, mut state: StateBlob, references: &[Reference]) -> Injected {
        let mut warnings = Vec::new();

        let Some(classification) = self.catalog.classification(state.kind()) else {
            let warning = ProtocolWarning::UnrecognizedType {
                kind: state.kind().to_string(),
            };
            if self.warn_on_unknown_type {
                warning.log();
            }
            warnings.push(warning);
            return Injected { state, warnings };
        };

        for name in duplicate_names(references) {
            if classification.slot_named(name).is_some() {
                let warning = ProtocolWarning::DuplicateReference {
                    name: name.to_string(),
                };
                warning.log();
                warnings.push(warning);
            }
        }

        let mut injected = 0usize;
        for slot in classification.reference_slots() {
            let Some(reference) = find_reference(references, slot.name) else {
                continue;
            };
            if reference.target_type != slot.target_type {
                let warning = ProtocolWarning::MalformedReference {
                    name: reference.name.clone(),
                    expected: slot.target_type.to_string(),
                    actual: reference.target_type.clone(),
                };
                warning.log();
                warnings.push(warning);
                continue;
            }
            state.set_path(slot.path, Value::String(reference.id.clone()));
            injected += 1;
        }

        tracing::debug!(kind = state.kind(), injected, "injected references");

        Injected { state, warnings }
    }
}

impl fmt::Debug for ReferenceInjector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceInjector")
            .field("warn_on_unknown_type", &self.warn_on_unknown_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pstate_model::{FieldClass, FieldClassification, FieldPath};
    use serde_json::json;
    use std::collections::HashMap;

    fn catalog() -> HashMap<String, FieldClassification> {
        let mut catalog = HashMap::new();
        catalog.insert(
            "search-embeddable".to_string(),
            FieldClassification::new()
                .with(
                    FieldPath::single("savedSearchId"),
                    FieldClass::reference("savedSearchRef", "search"),
                )
                .with(FieldPath::single("title"), FieldClass::FreeText),
        );
        catalog
    }

    fn blob(value: serde_json::Value) -> StateBlob {
        StateBlob::from_value(value).unwrap()
    }

    #[test]
    fn writes_matching_reference() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog);

        let state = injector.inject(
            blob(json!({"type": "search-embeddable", "title": "Logs"})),
            &[Reference::new("savedSearchRef", "search", "s-1")],
        );

        assert_eq!(
            state,
            blob(json!({"type": "search-embeddable", "title": "Logs", "savedSearchId": "s-1"}))
        );
    }

    #[test]
    fn unknown_names_are_ignored() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog);
        let input = blob(json!({"type": "search-embeddable"}));

        let result = injector.inject_with_report(
            input.clone(),
            &[Reference::new("panel_0", "visualization", "v-1")],
        );

        assert_eq!(result.state, input);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn missing_reference_leaves_field_absent() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog);
        let state = injector.inject(blob(json!({"type": "search-embeddable"})), &[]);
        assert!(state.get("savedSearchId").is_none());
    }

    #[test]
    fn wrong_type_is_ignored_with_warning() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog);

        let result = injector.inject_with_report(
            blob(json!({"type": "search-embeddable"})),
            &[Reference::new("savedSearchRef", "index-pattern", "dv-1")],
        );

        assert!(result.state.get("savedSearchId").is_none());
        assert_eq!(
            result.warnings,
            vec![ProtocolWarning::MalformedReference {
                name: "savedSearchRef".to_string(),
                expected: "search".to_string(),
                actual: "index-pattern".to_string(),
            }]
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog);

        let result = injector.inject_with_report(
            blob(json!({"type": "search-embeddable"})),
            &[
                Reference::new("savedSearchRef", "search", "first"),
                Reference::new("savedSearchRef", "search", "second"),
            ],
        );

        assert_eq!(result.state.get("savedSearchId"), Some(&json!("first")));
        assert!(matches!(
            result.warnings.as_slice(),
            [ProtocolWarning::DuplicateReference { .. }]
        ));
    }

    #[test]
    fn unknown_type_unchanged() {
        let catalog = catalog();
        let injector = ReferenceInjector::new(&catalog).warn_on_unknown_type(false);
        let input = blob(json!({"type": "unknown-x", "a": 1}));
        let state = injector.inject(input.clone(), &[Reference::new("a", "b", "c")]);
        assert_eq!(state, input);
    }
}
