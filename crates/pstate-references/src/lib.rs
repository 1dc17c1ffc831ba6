//! Persistable State References
//!
//! Decouples saved state from the ids of the entities it points at.
//!
//! # Core Operations
//!
//! - **Extract** (save): `StateBlob` → sanitized `StateBlob` + `Vec<Reference>`
//! - **Inject** (load): sanitized `StateBlob` + `&[Reference]` → `StateBlob`
//!
//! Both are pure and never fail; tolerated oddities come back as
//! [`ProtocolWarning`]s. For every blob `s` of a known kind,
//! `inject(extract(s).state, extract(s).references) == s`.
//!
//! # Example
//!
//! ```rust,ignore
//! use pstate_references::{ReferenceExtractor, ReferenceInjector};
//!
//! let extracted = ReferenceExtractor::new(&catalog).extract(blob.clone());
//! let restored = ReferenceInjector::new(&catalog).inject(extracted.state, &extracted.references);
//! assert_eq!(restored, blob);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod extract;
mod inject;
mod warning;

pub use extract::{Extracted, ReferenceExtractor};
pub use inject::{Injected, ReferenceInjector};
pub use warning::ProtocolWarning;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
