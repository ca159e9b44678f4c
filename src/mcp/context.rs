//! MCP Tool Execution Context
//!
//! Per-call bundle handed to tool and resource handlers.

use std::sync::Arc;

use super::error::ToolError;
use super::notifier::Notifier;
use crate::auth::CredentialStore;
use crate::backend::BackendClient;

/// Context provided to tool and resource handlers during execution.
///
/// Built by the transport adapter for a single call and dropped with it.
#[derive(Clone)]
pub struct ToolContext {
    /// The protocol session the call arrived on
    pub session_id: Option<String>,

    /// Side channel for progress and log notifications
    pub notifier: Notifier,

    /// Session credential bindings
    pub credentials: Arc<dyn CredentialStore>,

    /// Client for the restaurant backend
    pub backend: Arc<BackendClient>,
}

impl ToolContext {
    /// Resolve the token bound to this call's session.
    pub fn resolve_credential(&self) -> Result<String, ToolError> {
        let session_id = self.session_id.as_deref().ok_or(ToolError::MissingSession)?;
        self.credentials
            .resolve(session_id)
            .ok_or(ToolError::Unauthenticated)
    }
}

/// A call whose credential has already been resolved.
pub struct AuthorizedCall {
    pub ctx: ToolContext,
    pub token: String,
}

impl AuthorizedCall {
    pub fn backend(&self) -> &BackendClient {
        &self.ctx.backend
    }

    pub fn url(&self, path: &str) -> String {
        self.ctx.backend.url(path)
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.ctx.notifier.info(message).await;
    }
}
