//! MCP (Model Context Protocol) Server
//!
//! Exposes restaurant management operations as MCP tools, resources and
//! prompts. Every tool forwards the session's bound credential to the
//! restaurant backend.
//!
//! ## Architecture
//!
//! - Transport: streamable HTTP at `/mcp`, or newline-delimited stdio
//! - Auth: JWT validated on every message, bound per session
//! - Tools: schema-validated arguments, failures reported in-band
//! - Notifications: per-call SSE stream or the session's GET stream

pub mod context;
pub mod error;
pub mod handler;
pub mod notifier;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod session;
pub mod tools;
pub mod validation;

pub use handler::{create_mcp_state, McpState};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
