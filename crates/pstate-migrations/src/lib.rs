//! Persistable State Migrations
//!
//! Versioned evolution of each kind's stored shape.
//!
//! # Core Concepts
//!
//! - [`ModelChange`]: one declared transformation (backfill, removal, rename,
//!   mappings addition)
//! - [`ModelVersion`]: the changes and schemas of one version
//! - [`ModelVersionMap`]: a kind's contiguous chain of versions
//! - [`VersionMigrator`]: applies the chain over `(from, to]`
//!
//! Migration is forward-only. `migrate(s, a, c) == migrate(migrate(s, a, b), b, c)`
//! for `a <= b <= c`, and `migrate(s, v, v) == s`.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use pstate_migrations::{ModelChange, ModelVersion, ModelVersionMap, VersionMigrator};
//! use pstate_model::{SchemaVersion, StateBlob};
//! use serde_json::json;
//!
//! let mut catalog = HashMap::new();
//! catalog.insert(
//!     "rule".to_string(),
//!     ModelVersionMap::from_versions([ModelVersion::new(2u32)
//!         .with_change(ModelChange::backfill_defaults(vec![("revision".to_string(), json!(0))]))])
//!     .unwrap(),
//! );
//!
//! let blob = StateBlob::from_value(json!({"type": "rule"})).unwrap();
//! let migrated = VersionMigrator::new(&catalog)
//!     .migrate(blob, SchemaVersion::new(1), SchemaVersion::new(2))
//!     .unwrap();
//! assert_eq!(migrated.get("revision"), Some(&json!(0)));
//! ```

#![warn(unreachable_pub)]

mod change;
mod migrator;
mod model_version;
mod schema;

pub use change::{BackfillFn, ModelChange};
pub use migrator::{MigrationCatalog, MigrationError, VersionMigrator};
pub use model_version::{MigrationStep, ModelVersion, ModelVersionError, ModelVersionMap};
pub use schema::{FieldError, SchemaError, SchemaViolation, StateSchema, ValidationMode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
