//! Persistable State Telemetry
//!
//! Anonymized usage statistics derived from saved state.
//!
//! [`TelemetryReducer`] reads only fields a kind classifies as reportable
//! (flags, enumerations, collections, numbers). References and free text
//! are never read, so no identifier or user-entered string can appear in a
//! [`UsageSummary`]. [`UsageCollector`] folds many summaries together.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod collector;
mod reducer;
mod summary;

pub use collector::{UsageCollector, UsageReport};
pub use reducer::{TelemetryReducer, UNKNOWN_KIND, UNKNOWN_TOTAL};
pub use summary::{MetricValue, Stats, UsageSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
