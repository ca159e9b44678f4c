//! MCP client for end-to-end tests
//!
//! Wraps reqwest and speaks JSON-RPC over the streamable HTTP transport.
//! When the transport changes, update only this file.

use super::constants::*;
use super::tokens::token_for;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub struct McpTestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set
    pub token: Option<String>,
    /// Assigned by the server on `initialize`
    pub session_id: Option<String>,
    next_id: AtomicI64,
}

/// Pull the JSON payloads out of an SSE body.
pub fn parse_sse_messages(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str(data.trim()).ok())
        .collect()
}

impl McpTestClient {
    /// Creates a client that sends no credential
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url: base_url.to_string(),
            token: None,
            session_id: None,
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a client presenting a valid token for `user_id`
    pub fn authenticated(base_url: &str, user_id: i64) -> Self {
        let mut client = Self::new(base_url);
        client.token = Some(token_for(user_id));
        client
    }

    fn mcp_url(&self) -> String {
        format!("{}/mcp", self.base_url)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = match &self.token {
            Some(token) => builder.header("authorization", format!("Bearer {}", token)),
            None => builder,
        };
        match &self.session_id {
            Some(id) => builder.header(SESSION_HEADER, id),
            None => builder,
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    // ========================================================================
    // Raw transport
    // ========================================================================

    /// POST a raw JSON-RPC message
    pub async fn post(&self, message: &Value) -> Response {
        self.with_auth(self.client.post(self.mcp_url()))
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(message)
            .send()
            .await
            .expect("POST /mcp failed")
    }

    /// POST a raw JSON-RPC message, accepting an event stream back
    pub async fn post_streaming(&self, message: &Value) -> Response {
        self.with_auth(self.client.post(self.mcp_url()))
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .json(message)
            .send()
            .await
            .expect("POST /mcp failed")
    }

    /// Open the session's standalone notification stream
    pub async fn open_stream(&self) -> Response {
        self.with_auth(self.client.get(self.mcp_url()))
            .header("accept", "text/event-stream")
            .send()
            .await
            .expect("GET /mcp failed")
    }

    pub async fn delete_session(&self) -> Response {
        self.with_auth(self.client.delete(self.mcp_url()))
            .send()
            .await
            .expect("DELETE /mcp failed")
    }

    pub async fn health(&self) -> Value {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("GET /health failed")
            .json()
            .await
            .expect("Invalid health body")
    }

    // ========================================================================
    // JSON-RPC helpers
    // ========================================================================

    pub fn message(&self, method: &str, params: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params
        })
    }

    /// Perform the handshake and remember the assigned session id
    ///
    /// # Panics
    ///
    /// Panics if the handshake is not accepted.
    pub async fn initialize(&mut self) -> Value {
        let message = self.message(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "e2e", "version": "1.0" }
            }),
        );
        let response = self.post(&message).await;
        assert_eq!(response.status(), StatusCode::OK, "handshake rejected");

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("No session id on handshake")
            .to_string();
        self.session_id = Some(session_id);

        let body: Value = response.json().await.expect("Invalid handshake body");

        // Anonymous clients get this one rejected, which is fine for the handshake
        let initialized = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        self.post(&initialized).await;

        body
    }

    /// Send a request and return the whole JSON-RPC response
    pub async fn request(&self, method: &str, params: Value) -> Value {
        let response = self.post(&self.message(method, params)).await;
        response.json().await.expect("Invalid JSON-RPC response")
    }

    /// Call a tool and return its `result`
    ///
    /// # Panics
    ///
    /// Panics if the call fails at the protocol level.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await;
        assert!(
            response.get("error").is_none(),
            "tools/call {} failed: {}",
            name,
            response
        );
        response["result"].clone()
    }

    /// Call a tool over SSE and return every streamed message, response last
    pub async fn call_tool_streaming(
        &self,
        name: &str,
        arguments: Value,
        progress_token: &str,
    ) -> Vec<Value> {
        let message = self.message(
            "tools/call",
            json!({
                "name": name,
                "arguments": arguments,
                "_meta": { "progressToken": progress_token }
            }),
        );
        let response = self.post_streaming(&message).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .starts_with("text/event-stream"));

        let body = response.text().await.expect("Failed to read event stream");
        parse_sse_messages(&body)
    }
}

/// Text of the first content item of a tool result
#[allow(dead_code)]
pub fn result_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}
