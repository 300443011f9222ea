//! Hyper HTTP client shared by the provider and chat API clients.
//!
//! Connection pool settings are tuned for a handful of long-lived hosts:
//! - Max idle connections per host: 16
//! - Max idle connection duration: 90s
//! - Connection timeout: 5s
//! - TCP keep-alive: 30s
//! - TCP_NODELAY: enabled

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::dns::GaiResolver;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Connection pool configuration constants.
pub const CONNS_PER_HOST: usize = 16;
pub const MAX_IDLE_CONN_DURATION: Duration = Duration::from_secs(90);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub type HyperClient =
    Client<HttpsConnector<HttpConnector<GaiResolver>>, BoxBody<Bytes, hyper::Error>>;

/// Failure modes of a single request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),
    #[error("request failed: {0}")]
    Connection(#[from] hyper_util::client::legacy::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),
}

/// Creates a Hyper HTTP client speaking HTTP/1.1 over plain TCP or TLS.
pub fn create_client() -> Result<HyperClient> {
    let resolver = GaiResolver::new();

    let mut http_connector = HttpConnector::new_with_resolver(resolver);
    http_connector.enforce_http(false);
    http_connector.set_nodelay(true);
    http_connector.set_keepalive(Some(Duration::from_secs(30)));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));

    let roots = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!(
                component = "http_client",
                event = "native_roots_unavailable",
                error = %e,
                "falling back to bundled root certificates"
            );
            hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };
    let tls = roots
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    Ok(Client::builder(TokioExecutor::new())
        .pool_idle_timeout(MAX_IDLE_CONN_DURATION)
        .pool_max_idle_per_host(CONNS_PER_HOST)
        .build(tls))
}

/// Sends a request with an optional body and collects the full response.
///
/// The whole exchange (headers and body) is bounded by `timeout_duration`.
pub async fn send(
    client: &HyperClient,
    method: Method,
    uri: Uri,
    headers: &[(&str, &str)],
    body: Option<Bytes>,
    timeout_duration: Duration,
) -> Result<(u16, Bytes), TransportError> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let req_body: BoxBody<Bytes, hyper::Error> = match body {
        Some(bytes) => Full::new(bytes)
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
        None => Empty::<Bytes>::new()
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
    };
    let req = builder.body(req_body)?;

    let exchange = async {
        let response = client.request(req).await?;
        let status = response.status().as_u16();
        let body = response.into_body().collect().await?.to_bytes();
        Ok::<_, TransportError>((status, body))
    };

    match timeout(timeout_duration, exchange).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout_duration)),
    }
}
