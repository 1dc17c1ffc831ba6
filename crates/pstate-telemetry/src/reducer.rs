//! Usage reduction
//!
//! Turns one blob into an anonymized [`UsageSummary`]. Only fields the kind
//! classifies as reportable are ever read, so identifiers and user-entered
//! text cannot reach a summary.

use std::fmt;

use pstate_model::{FieldCatalog, FieldClass, FieldPath, StateBlob};
use serde_json::Value;

use crate::summary::UsageSummary;

/// Kind name that unrecognized kinds are reported under
pub const UNKNOWN_KIND: &str = "unknown";

/// Metric recorded for blobs of unrecognized kinds when enabled
pub const UNKNOWN_TOTAL: &str = "unknown.total";

/// Reduces blobs to usage summaries using each kind's classification
#[derive(Clone, Copy)]
pub struct TelemetryReducer<'a> {
    catalog: &'a dyn FieldCatalog,
    include_unknown_kinds: bool,
}

impl<'a> TelemetryReducer<'a> {
    /// Create a reducer over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: &'a dyn FieldCatalog) -> Self {
        Self {
            catalog,
            include_unknown_kinds: false,
        }
    }

    /// Whether unrecognized kinds count towards [`UNKNOWN_TOTAL`]
    #[inline]
    #[must_use]
    pub fn include_unknown_kinds(mut self, include: bool) -> Self {
        self.include_unknown_kinds = include;
        self
    }

    /// Reduce one blob
    #[must_use]
    pub fn reduce(&self, state: &StateBlob) -> UsageSummary {
        let mut summary = UsageSummary::new();

        let Some(classification) = self.catalog.classification(state.kind()) else {
            if self.include_unknown_kinds {
                summary.increment(UNKNOWN_TOTAL, 1);
            }
            return summary;
        };

        let kind = state.kind();
        summary.increment(format!("{kind}.total"), 1);

        for spec in classification.reportable() {
            let Some(value) = state.get_path(&spec.path) else {
                continue;
            };
            report_field(&mut summary, kind, &spec.path, &spec.class, value);
        }

        summary
    }
}

fn report_field(
    summary: &mut UsageSummary,
    kind: &str,
    path: &FieldPath,
    class: &FieldClass,
    value: &Value,
) {
    let metric = format!("{kind}.{path}");
    match (class, value) {
        (FieldClass::Flag, Value::Bool(on)) => summary.increment(metric, u64::from(*on)),
        (FieldClass::Enumerated { allowed }, Value::String(chosen)) => {
            let variant = if allowed.iter().any(|a| a == chosen) {
                chosen.as_str()
            } else {
                "other"
            };
            summary.increment(format!("{metric}.{variant}"), 1);
        }
        #[allow(clippy::cast_precision_loss)]
        (FieldClass::Collection, Value::Array(items)) => {
            summary.record(format!("{metric}.length"), items.len() as f64);
        }
        (FieldClass::Numeric, Value::Number(n)) => {
            if let Some(n) = n.as_f64() {
                summary.record(metric, n);
            }
        }
        // Identifying and opaque classes never get here; mistyped values
        // are not reported.
        _ => {}
    }
}

impl fmt::Debug for TelemetryReducer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryReducer")
            .field("include_unknown_kinds", &self.include_unknown_kinds)
            .finish_non_exhaustive()
    }
}
