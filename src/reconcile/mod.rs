//! Reconciliation of cached service status against the provider.

pub mod reconciler;


pub use reconciler::Reconciler;
