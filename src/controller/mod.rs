// HTTP controllers of the health server.

pub mod controller;
pub mod health;
pub mod metrics;


pub use controller::Controller;
pub use health::HealthController;
pub use metrics::PrometheusMetricsController;
