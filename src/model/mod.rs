// Package model provides service registry records, audit entries and batch tallies.

pub mod audit;
pub mod record;
pub mod status;
pub mod tally;


// Re-export main types
pub use audit::{Action, AuditLogEntry, API_REQUEST_FAILED};
pub use record::ServiceRecord;
pub use status::{ServiceStatus, UnknownValueError};
pub use tally::{BatchAction, BatchTally};
