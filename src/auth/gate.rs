//! Authenticating gate evaluated on every inbound protocol message.
//!
//! The gate is transport-agnostic: adapters describe a message with an
//! [`InboundEnvelope`] and either forward it with the returned
//! [`AuthContext`] or answer with the [`GateError`] envelope. Binding is a
//! separate step so it can wait until the session owner is known.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::credential_store::CredentialStore;
use super::token::TokenValidator;

/// The method that establishes a new session.
pub const HANDSHAKE_METHOD: &str = "initialize";

const BEARER_PREFIX: &str = "Bearer ";

/// What the gate needs to know about an inbound message.
#[derive(Debug, Clone, Copy)]
pub struct InboundEnvelope<'a> {
    /// Raw value of the `authorization` field, if any.
    pub authorization: Option<&'a str>,
    /// The `mcp-session-id` the message belongs to, if already assigned.
    pub session_id: Option<&'a str>,
    /// JSON-RPC method of the message.
    pub method: &'a str,
}

impl InboundEnvelope<'_> {
    fn is_handshake(&self) -> bool {
        self.session_id.is_none() && self.method == HANDSHAKE_METHOD
    }
}

/// Outcome of an admitted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Decoded user id; absent only for a handshake that carried no token.
    pub subject: Option<String>,
    /// The validated raw token (prefix stripped).
    pub token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            subject: None,
            token: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] jsonwebtoken::errors::Error),
}

/// Extract the token from an authorization value, stripping an optional
/// `Bearer ` prefix. Blank values count as absent.
pub fn extract_token(authorization: Option<&str>) -> Option<&str> {
    let raw = authorization?.trim_start();
    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub struct AuthGate {
    validator: TokenValidator,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(validator: TokenValidator, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            validator,
            credentials,
        }
    }

    /// Validate the message's credential without touching the store.
    ///
    /// A handshake without a token passes through anonymously. A handshake
    /// that does carry a token must carry a valid one.
    pub fn authenticate(&self, envelope: &InboundEnvelope<'_>) -> Result<AuthContext, GateError> {
        let token = match extract_token(envelope.authorization) {
            Some(token) => token,
            None if envelope.is_handshake() => {
                debug!("Handshake without credential admitted");
                return Ok(AuthContext::anonymous());
            }
            None => {
                debug!(
                    "Rejecting {} without credential (session: {:?})",
                    envelope.method, envelope.session_id
                );
                return Err(GateError::MissingCredential);
            }
        };

        let claims = self.validator.validate(token).map_err(|e| {
            warn!(
                "Token verification failed for {} (session: {:?}): {}",
                envelope.method, envelope.session_id, e
            );
            GateError::InvalidCredential(e)
        })?;

        Ok(AuthContext {
            subject: Some(claims.user_id.to_string()),
            token: Some(token.to_string()),
        })
    }

    /// Record an authenticated token as the credential of `session_id`.
    ///
    /// Callers bind only once they know the session belongs to the token's
    /// user.
    pub fn bind(&self, session_id: &str, auth: &AuthContext) {
        if let Some(token) = &auth.token {
            self.credentials.bind(session_id, token);
            debug!(
                "User authenticated - session: {}, user: {}",
                session_id,
                auth.subject.as_deref().unwrap_or("unknown")
            );
        }
    }
}
