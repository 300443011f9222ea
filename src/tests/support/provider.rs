// Stub of the provider HTTP API for client tests.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Scripted behaviour of one stub service.
#[derive(Clone, Default)]
pub struct StubService {
    /// Payload served on GET; `None` answers 404.
    pub payload: Option<Value>,
    /// Raw body served on GET instead of the payload.
    pub raw_body: Option<String>,
    /// Operations answer 500.
    pub fail_ops: bool,
    /// Delay before answering a lookup.
    pub fetch_delay: Duration,
    /// Delay before answering an operation.
    pub op_delay: Duration,
}

#[derive(Default)]
pub struct ProviderState {
    pub services: HashMap<String, StubService>,
    pub authorization: Vec<String>,
    pub requests: Vec<(String, String)>,
}

type Shared = Arc<Mutex<ProviderState>>;

/// Provider stub server listening on a random local port.
pub struct ProviderServer {
    addr: String,
    state: Shared,
    handle: JoinHandle<()>,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

fn remember(state: &Shared, headers: &HeaderMap, method: &str, path: String) -> StubService {
    let mut state = state.lock();
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorization.push(auth.to_string());
    }
    let id = path
        .trim_start_matches("/v1/services/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    state.requests.push((method.to_string(), path));
    state.services.get(&id).cloned().unwrap_or_default()
}

async fn get_service(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let service = remember(&state, &headers, "GET", format!("/v1/services/{}", id));
    tokio::time::sleep(service.fetch_delay).await;

    if let Some(raw) = service.raw_body {
        return (StatusCode::OK, raw).into_response();
    }
    match service.payload {
        Some(payload) => (StatusCode::OK, axum::Json(payload)).into_response(),
        None => (StatusCode::NOT_FOUND, axum::Json(json!({"message": "not found"}))).into_response(),
    }
}

async fn operate(
    State(state): State<Shared>,
    Path((id, op)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let service = remember(&state, &headers, "POST", format!("/v1/services/{}/{}", id, op));
    tokio::time::sleep(service.op_delay).await;

    if service.payload.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if service.fail_ops {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let suspended = match op.as_str() {
        "suspend" => Some("suspended"),
        "resume" => Some("not_suspended"),
        "restart" => None,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    if let Some(suspended) = suspended {
        if let Some(stub) = state.lock().services.get_mut(&id) {
            stub.payload = Some(json!({"id": id, "suspended": suspended}));
        }
    }
    // The provider acknowledges operations with an empty 202.
    StatusCode::ACCEPTED.into_response()
}

impl ProviderServer {
    /// Starts the stub server.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ProviderState::default()));

        let router = Router::new()
            .route("/v1/services/:id", get(get_service))
            .route("/v1/services/:id/:op", post(operate))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, router);
            tokio::select! {
                _ = server => {},
                _ = shutdown_rx => {},
            }
        });

        Self {
            addr: format!("127.0.0.1:{}", addr.port()),
            state,
            handle,
            shutdown: shutdown_tx,
        }
    }

    /// Base URL to configure the client with.
    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn put(&self, service_id: &str, service: StubService) {
        self.state.lock().services.insert(service_id.to_string(), service);
    }

    pub fn payload(&self, service_id: &str) -> Option<Value> {
        self.state.lock().services.get(service_id).and_then(|s| s.payload.clone())
    }

    pub fn authorization(&self) -> Vec<String> {
        self.state.lock().authorization.clone()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().requests.clone()
    }

    /// Closes the stub server.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        self.handle.abort();
    }
}
