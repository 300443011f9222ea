#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod access;
pub mod app;
pub mod batch;
pub mod bot;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod shutdown;
