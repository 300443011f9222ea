//! Metrics controller.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::http::Controller;

pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

/// Installs the global Prometheus recorder and returns its render handle.
///
/// Must be called once per process.
pub fn init_prometheus_exporter() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
}

/// PrometheusMetricsController renders the recorded counters.
pub struct PrometheusMetricsController {
    handle: PrometheusHandle,
}

impl PrometheusMetricsController {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }
}

impl Controller for PrometheusMetricsController {
    fn add_route(&self, router: Router) -> Router {
        let handle = self.handle.clone();
        router.route(
            PROMETHEUS_METRICS_PATH,
            get(move || {
                let handle = handle.clone();
                async move {
                    (
                        StatusCode::OK,
                        [("content-type", "text/plain; version=0.0.4")],
                        handle.render(),
                    )
                        .into_response()
                }
            }),
        )
    }
}
