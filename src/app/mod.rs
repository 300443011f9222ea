//! Application wiring and lifecycle.

mod app;

pub use app::App;
