//! Health server.

mod server;

pub use server::{HttpServer, Server};
