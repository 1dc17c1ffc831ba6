//! Persistable State Model
//!
//! Value types shared by every stage of the persistable-state protocol.
//!
//! # Core Concepts
//!
//! - [`StateBlob`]: typed, JSON-shaped state of one UI entity
//! - [`Reference`]: symbolic pointer to a foreign entity, stored beside the blob
//! - [`SavedObject`]: the persisted `{attributes, references, schemaVersion}` record
//! - [`FieldClassification`]: per-kind description of what each field holds
//! - [`SchemaVersion`]: ordinal version of a kind's stored shape
//!
//! # Example
//!
//! ```rust
//! use pstate_model::{FieldPath, StateBlob};
//! use serde_json::json;
//!
//! let blob = StateBlob::from_value(json!({"type": "options-list", "dataViewId": "dv-1"})).unwrap();
//! assert_eq!(blob.kind(), "options-list");
//! assert_eq!(blob.get_path(&FieldPath::single("dataViewId")), Some(&json!("dv-1")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod blob;
mod field;
mod hash;
mod path;
mod record;
mod reference;
mod version;

pub use blob::{canonical_json, BlobError, StateBlob, TYPE_KEY};
pub use field::{FieldCatalog, FieldClass, FieldClassification, FieldSpec, ReferenceSlot};
pub use hash::{ContentHash, HashError};
pub use path::{FieldPath, PathError};
pub use record::SavedObject;
pub use reference::{duplicate_names, find_reference, Reference};
pub use version::SchemaVersion;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
