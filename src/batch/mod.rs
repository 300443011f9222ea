//! Bulk and single-service remote operations with audit and tally.

pub mod executor;


pub use executor::{BatchExecutor, OpOutcome};
