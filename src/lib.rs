//! Restaurant MCP Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod auth;
pub mod backend;
pub mod config;
pub mod mcp;
pub mod server;

// Re-export commonly used types for convenience
pub use auth::{AuthGate, CredentialStore, InMemoryCredentialStore, TokenValidator};
pub use backend::BackendClient;
pub use server::{run_server, run_stdio, RequestsLoggingLevel, ServerConfig};
