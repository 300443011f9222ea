//! Liveness endpoints for the hosting platform and uptime monitors.

use axum::{http::StatusCode, routing::get, Router};

use crate::http::Controller;

pub const HEALTH_PATHS: [&str; 4] = ["/", "/health", "/healthz", "/_health"];

const PLAIN_TEXT: [(&str, &str); 1] = [("content-type", "text/plain; charset=utf-8")];

/// Answers `ok` on the health paths and `not found` everywhere else.
///
/// `get` routes also answer HEAD, with the body stripped.
pub struct HealthController;

impl HealthController {
    pub fn new() -> Self {
        Self
    }

    async fn ok() -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
        (StatusCode::OK, PLAIN_TEXT, "ok")
    }

    async fn not_found() -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
        (StatusCode::NOT_FOUND, PLAIN_TEXT, "not found")
    }
}

impl Default for HealthController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for HealthController {
    fn add_route(&self, router: Router) -> Router {
        HEALTH_PATHS
            .iter()
            .fold(router, |router, path| router.route(path, get(Self::ok)))
            .fallback(Self::not_found)
    }
}
