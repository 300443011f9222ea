//! Integration tests for opsbot.
//!
//! Cases run the provider client against a local stub of the provider API,
//! and the chat surface end to end over a real SQLite registry.


pub mod support;
