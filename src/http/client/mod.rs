//! Outbound HTTP plumbing.

mod hyper_client;

pub use hyper_client::{create_client, send, HyperClient, TransportError};
