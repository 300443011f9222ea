//! Render control API client.

use anyhow::{Context, Result};
use bytes::Bytes;
use hyper::{Method, Uri};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{RemoteClient, ServiceInfo};
use crate::config::Remote;
use crate::http::client::{self, HyperClient};

pub const DEFAULT_API_BASE: &str = "https://api.render.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the provider over HTTPS with a bearer token.
pub struct RenderClient {
    client: HyperClient,
    base_url: String,
    authorization: String,
    timeout: Duration,
}

impl RenderClient {
    /// Creates a new provider client on top of a shared connection pool.
    pub fn new(cfg: Option<&Remote>, client: HyperClient) -> Result<Self> {
        let cfg = cfg.context("remote configuration is required")?;
        let api_key = cfg
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("remote.api_key must be configured")?;
        let base_url = cfg
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            authorization: format!("Bearer {}", api_key),
            timeout: cfg.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    fn service_uri(&self, service_id: &str, suffix: &str) -> Option<Uri> {
        let url = format!(
            "{}/services/{}{}",
            self.base_url,
            urlencoding::encode(service_id),
            suffix
        );
        match url.parse() {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!(component = "remote", url = %url, error = %e, "invalid provider url");
                None
            }
        }
    }

    /// Performs one request; every failure collapses into `None`.
    async fn request(&self, method: Method, service_id: &str, suffix: &str) -> Option<Value> {
        let uri = self.service_uri(service_id, suffix)?;
        let headers = [
            ("authorization", self.authorization.as_str()),
            ("content-type", "application/json"),
            ("accept", "application/json"),
        ];
        let body = (method == Method::POST).then(Bytes::new);

        let (status, body) =
            match client::send(&self.client, method.clone(), uri, &headers, body, self.timeout).await {
                Ok(rsp) => rsp,
                Err(e) => {
                    warn!(
                        component = "remote",
                        event = "request_failed",
                        method = %method,
                        service_id = service_id,
                        error = %e,
                        "provider request failed"
                    );
                    return None;
                }
            };

        if !(200..300).contains(&status) {
            warn!(
                component = "remote",
                event = "bad_status",
                method = %method,
                service_id = service_id,
                status = status,
                body = %String::from_utf8_lossy(&body),
                "provider returned non-success status"
            );
            return None;
        }

        if body.is_empty() {
            return Some(Value::Object(Default::default()));
        }

        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    component = "remote",
                    event = "malformed_body",
                    method = %method,
                    service_id = service_id,
                    error = %e,
                    "provider returned malformed json"
                );
                None
            }
        }
    }

    async fn post(&self, service_id: &str, op: &str) -> bool {
        let ok = self
            .request(Method::POST, service_id, &format!("/{}", op))
            .await
            .is_some();
        debug!(component = "remote", op = op, service_id = service_id, ok = ok, "operation finished");
        ok
    }
}

#[async_trait::async_trait]
impl RemoteClient for RenderClient {
    async fn fetch(&self, service_id: &str) -> Option<ServiceInfo> {
        let payload = self.request(Method::GET, service_id, "").await?;
        ServiceInfo::from_payload(&payload)
    }

    async fn set_suspended(&self, service_id: &str) -> bool {
        self.post(service_id, "suspend").await
    }

    async fn set_resumed(&self, service_id: &str) -> bool {
        self.post(service_id, "resume").await
    }

    async fn restart(&self, service_id: &str) -> bool {
        self.post(service_id, "restart").await
    }
}
