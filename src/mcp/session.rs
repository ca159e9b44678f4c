//! Protocol sessions.
//!
//! A session is opened by the handshake and lives until it is explicitly
//! terminated or its transport goes away. Terminating a session always
//! removes its credential binding.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notifier::{Notifier, NOTIFICATION_BUFFER};
use super::protocol::McpNotification;
use crate::auth::{AuthContext, CredentialStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),

    #[error("session {session_id} belongs to user {expected}, not {actual}")]
    SubjectMismatch {
        session_id: String,
        expected: String,
        actual: String,
    },
}

struct SessionEntry {
    /// User the session belongs to, fixed by the first validated token
    subject: Option<String>,
    /// Standalone notification stream opened with GET
    stream: Option<mpsc::Sender<McpNotification>>,
    opened_at: Instant,
}

pub struct SessionManager {
    sessions: DashMap<String, SessionEntry>,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionManager {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            sessions: DashMap::new(),
            credentials,
        }
    }

    /// Open a new session for an admitted handshake.
    ///
    /// When the handshake carried a valid token it is bound right away.
    pub fn open(&self, auth: &AuthContext) -> String {
        let session_id = Uuid::new_v4().to_string();

        self.sessions.insert(
            session_id.clone(),
            SessionEntry {
                subject: auth.subject.clone(),
                stream: None,
                opened_at: Instant::now(),
            },
        );

        if let Some(token) = &auth.token {
            self.credentials.bind(&session_id, token);
        }

        info!(
            "Session {} opened (user: {})",
            session_id,
            auth.subject.as_deref().unwrap_or("anonymous")
        );
        session_id
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Run `bind` for `subject` if the session is live and theirs.
    ///
    /// A session opened anonymously adopts the first subject it sees. The
    /// session entry stays locked while `bind` runs, so a concurrent
    /// [`terminate`](Self::terminate) either happens before (and nothing is
    /// bound) or after (and unbinds what was bound).
    pub fn bind_if_owner(
        &self,
        session_id: &str,
        subject: Option<&str>,
        bind: impl FnOnce(),
    ) -> Result<(), SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        match (entry.subject.as_deref(), subject) {
            (_, None) => {}
            (None, Some(subject)) => {
                debug!("Session {} now belongs to user {}", session_id, subject);
                entry.subject = Some(subject.to_string());
            }
            (Some(expected), Some(actual)) if expected == actual => {}
            (Some(expected), Some(actual)) => {
                warn!(
                    "Session {} user mismatch: expected {}, got {}",
                    session_id, expected, actual
                );
                return Err(SessionError::SubjectMismatch {
                    session_id: session_id.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        bind();
        Ok(())
    }

    /// Open the session's standalone notification stream, replacing any
    /// previous one.
    pub fn attach_stream(
        &self,
        session_id: &str,
    ) -> Result<mpsc::Receiver<McpNotification>, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        if entry.stream.replace(tx).is_some() {
            debug!("Replaced notification stream of session {}", session_id);
        }
        Ok(rx)
    }

    /// A notifier writing to the session's standalone stream, or a detached
    /// one when no stream is open.
    pub fn stream_notifier(&self, session_id: &str) -> Notifier {
        self.sessions
            .get(session_id)
            .and_then(|entry| entry.stream.clone())
            .filter(|tx| !tx.is_closed())
            .map(Notifier::new)
            .unwrap_or_default()
    }

    /// Close the session and drop its credential.
    pub fn terminate(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id);
        self.credentials.unbind(session_id);

        match removed {
            Some((_, entry)) => {
                info!(
                    "Session {} terminated after {:?}",
                    session_id,
                    entry.opened_at.elapsed()
                );
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
