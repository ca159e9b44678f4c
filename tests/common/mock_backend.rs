//! Restaurant backend stub
//!
//! Answers canned responses per `(method, path)` and records every request
//! it receives so tests can check what the server forwarded.

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct BackendState {
    responses: HashMap<(String, String), (u16, Value)>,
    requests: Vec<RecordedRequest>,
}

type SharedState = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    /// Base URL the server under test should call, e.g. "http://127.0.0.1:1234/api/v1"
    pub base_url: String,
    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

const API_PREFIX: &str = "/api/v1";

async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let path = path
        .strip_prefix(API_PREFIX)
        .map(str::to_string)
        .unwrap_or(path);

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).ok(),
    });

    match state.responses.get(&(method.to_string(), path)) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body.clone()),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Route not mocked" })),
        ),
    }
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(BackendState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let port = listener.local_addr().expect("No local address").port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock backend failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}{}", port, API_PREFIX),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Answer `method path` with `status` and a JSON `body`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
