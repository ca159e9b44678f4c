//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own credential store and
//! sessions, pointed at the test's mock backend.

use super::constants::*;
use restaurant_mcp::auth::{AuthGate, CredentialStore, InMemoryCredentialStore, TokenValidator};
use restaurant_mcp::backend::BackendClient;
use restaurant_mcp::mcp::{create_mcp_state, McpState};
use restaurant_mcp::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Shared MCP state, for inspecting sessions and bindings
    pub mcp_state: Arc<McpState>,

    /// Credential store the server binds tokens into
    pub credentials: Arc<dyn CredentialStore>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, calling `backend_url`
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be built or bound, or doesn't become
    /// ready within timeout.
    pub async fn spawn(backend_url: &str) -> Self {
        let credentials: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
        let gate = Arc::new(AuthGate::new(
            TokenValidator::new(JWT_SECRET, false),
            credentials.clone(),
        ));
        let backend = Arc::new(
            BackendClient::new(backend_url, Some(REQUEST_TIMEOUT_SECS))
                .expect("Failed to build backend client"),
        );
        let mcp_state = Arc::new(
            create_mcp_state(credentials.clone(), backend, gate)
                .expect("Failed to build MCP state"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
        };
        let app = make_app(config, mcp_state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            mcp_state,
            credentials,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling /health
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
