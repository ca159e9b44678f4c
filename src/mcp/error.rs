//! Errors raised while registering or running tools.

use thiserror::Error;

use crate::backend::BackendError;

/// A failed tool invocation. Its `Display` text is what the caller sees in
/// the error-flagged tool result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Error: Could not determine session ID for authentication")]
    MissingSession,

    #[error("Error: Authentication token not found. Please login again.")]
    Unauthenticated,

    #[error("Failed to {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: BackendError,
    },

    /// The backend answered 2xx but reported a logical failure.
    #[error("{0}")]
    DomainFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Adapter for `map_err` that tags a backend failure with what the
    /// tool was trying to do.
    pub fn backend(action: &'static str) -> impl FnOnce(BackendError) -> ToolError {
        move |source| ToolError::Backend { action, source }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation",
            ToolError::MissingSession => "missing_session",
            ToolError::Unauthenticated => "unauthenticated",
            ToolError::Backend {
                source: BackendError::Upstream { .. },
                ..
            } => "upstream",
            ToolError::Backend { .. } => "transport",
            ToolError::DomainFailure(_) => "domain_failure",
            ToolError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("prompt '{0}' is already registered")]
    DuplicatePrompt(String),

    #[error("tool '{tool}' has an invalid input schema: {reason}")]
    InvalidSchema { tool: String, reason: String },
}
