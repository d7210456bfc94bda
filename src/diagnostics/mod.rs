//! Driver-facing diagnostics.
//!
//! Nothing here logs or publishes; the values are handed back to the
//! training driver to report however it likes.
//!
//! - [`audit`] - append-only record of aggregated rounds
//! - [`deviation`] - per-client distance to the aggregate

pub mod audit;
pub mod deviation;

pub use audit::{AuditLog, RoundRecord};
pub use deviation::client_deviations;
