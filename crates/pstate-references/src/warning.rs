//! Non-fatal protocol warnings
//!
//! Extraction and injection never fail. Anything questionable they meet is
//! reported as a [`ProtocolWarning`] and logged.

/// Something the protocol tolerated instead of failing on
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolWarning {
    /// The blob's kind is not registered; it passed through unchanged
    #[error("unrecognized state type '{kind}'; passed through unchanged")]
    UnrecognizedType { kind: String },

    /// A reference field held something other than a string id
    #[error("field '{path}' of '{kind}' holds a non-string identifier; left in place")]
    MalformedField { kind: String, path: String },

    /// A reference matched an expected name but carried the wrong type
    #[error("reference '{name}' has type '{actual}', expected '{expected}'; ignored")]
    MalformedReference {
        name: String,
        expected: String,
        actual: String,
    },

    /// The same reference name occurred more than once
    #[error("reference '{name}' appears more than once; first occurrence used")]
    DuplicateReference { name: String },
}

impl ProtocolWarning {
    /// Emit through `tracing`
    pub fn log(&self) {
        tracing::warn!(warning = %self, "persistable state warning");
    }
}
