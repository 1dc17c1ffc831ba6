//! Persistable State Core
//!
//! Ties the protocol together:
//! - [`KindRegistry`]: the one place each kind's classification and model
//!   versions are declared
//! - [`ProtocolConfig`]: explicit configuration, passed by reference
//! - [`PersistableStateService`]: save and load through a [`SavedObjectStore`]
//!
//! # Example
//!
//! ```rust
//! use pstate_core::prelude::*;
//! use serde_json::json;
//!
//! let registry = KindRegistry::with_builtin_kinds().unwrap();
//! let service = PersistableStateService::new(registry, ProtocolConfig::default(), InMemoryStore::new());
//!
//! let state = StateBlob::from_value(json!({
//!     "type": "options-list",
//!     "dataViewId": "dv-1",
//!     "title": "Hosts"
//! }))
//! .unwrap();
//! let saved = service.create(Some("ctrl-1"), state).unwrap();
//! assert!(!saved.record.attributes.contains_key("dataViewId"));
//!
//! let loaded = service.load("options-list", "ctrl-1").unwrap();
//! assert_eq!(loaded.state.get("dataViewId"), Some(&json!("dv-1")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod kind;
pub mod kinds;
pub mod registry;
pub mod service;
pub mod store;

pub use config::{
    ConfigError, MigrationSettings, ProtocolConfig, ReferenceSettings, StoreSettings,
    TelemetrySettings,
};
pub use error::{LoadError, SaveError, LOAD_FAILURE_MESSAGE};
pub use kind::{KindBuilder, KindDefinition, KindError};
pub use registry::{KindRegistry, RegistryError};
pub use service::{Loaded, PersistableStateService, Saved};
pub use store::{InMemoryStore, RecordDraft, SavedObjectStore, StoreError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with persistable state
    pub use crate::{
        InMemoryStore, KindDefinition, KindRegistry, LoadError, PersistableStateService,
        ProtocolConfig, SavedObjectStore,
    };
    pub use pstate_model::{FieldClass, FieldPath, Reference, SavedObject, SchemaVersion, StateBlob};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
