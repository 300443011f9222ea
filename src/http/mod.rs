// HTTP module: health server and outbound client.

pub mod client;
pub mod server;

// Re-export server types
pub use server::{HttpServer, Server};

// Common controller interface
pub use crate::controller::controller::Controller;
