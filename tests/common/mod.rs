//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MockBackend, McpTestClient, TestServer, USER_ID};
//!
//! #[tokio::test]
//! async fn test_list_tools() {
//!     let backend = MockBackend::spawn().await;
//!     let server = TestServer::spawn(&backend.base_url).await;
//!     let mut client = McpTestClient::authenticated(&server.base_url, USER_ID);
//!
//!     client.initialize().await;
//!     let tools = client.request("tools/list", serde_json::json!({})).await;
//! }
//! ```

mod client;
mod constants;
mod mock_backend;
mod server;
mod tokens;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::{parse_sse_messages, result_text, McpTestClient};
pub use constants::*;
#[allow(unused_imports)]
pub use mock_backend::{MockBackend, RecordedRequest};
pub use server::TestServer;
#[allow(unused_imports)]
pub use tokens::{expired_token, forged_token, token_for};
