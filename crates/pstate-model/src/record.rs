//! Persisted saved-object records
//!
//! The stored document shape is `{ id, type, attributes, references, schemaVersion }`
//! with `references` a sibling of `attributes`, never nested inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::blob::StateBlob;
use crate::hash::ContentHash;
use crate::reference::Reference;
use crate::version::SchemaVersion;

/// One stored saved object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedObject {
    /// Record identifier, unique per kind
    pub id: String,

    /// Kind discriminator of the stored state
    #[serde(rename = "type")]
    pub kind: String,

    /// Sanitized state, without the discriminator
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// References pulled out of `attributes`
    #[serde(default)]
    pub references: Vec<Reference>,

    /// Schema version `attributes` was written at
    #[serde(default)]
    pub schema_version: SchemaVersion,

    /// Optimistic concurrency token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ContentHash>,

    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SavedObject {
    /// Build a record from a sanitized blob and its references
    #[must_use]
    pub fn from_sanitized(
        id: impl Into<String>,
        state: StateBlob,
        references: Vec<Reference>,
        schema_version: SchemaVersion,
    ) -> Self {
        let kind = state.kind().to_string();
        Self {
            id: id.into(),
            kind,
            attributes: state.into_fields(),
            references,
            schema_version,
            version: None,
            updated_at: None,
        }
    }

    /// The stored (still sanitized) state as a blob
    #[must_use]
    pub fn state(&self) -> StateBlob {
        StateBlob::from_parts(self.kind.clone(), self.attributes.clone())
    }

    /// Hash over everything a writer controls
    ///
    /// `version` and `updated_at` are excluded so the token only changes
    /// when content does.
    #[must_use]
    pub fn compute_version(&self) -> ContentHash {
        ContentHash::of_json(&json!({
            "id": self.id,
            "type": self.kind,
            "attributes": self.attributes,
            "references": self.references,
            "schemaVersion": self.schema_version,
        }))
    }

    /// Stamp the concurrency token and write time
    #[must_use]
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.version = Some(self.compute_version());
        self.updated_at = Some(now);
        self
    }
}
