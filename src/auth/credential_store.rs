//! Session credential bindings.
//!
//! Maps a protocol session id to the bearer token that was last validated
//! for it. Every tool invocation resolves its outbound credential here.

use dashmap::DashMap;
use tracing::debug;

/// Storage for session -> token bindings.
///
/// At most one token is bound per session; binding again overwrites.
/// A missing binding is not an error at this layer.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Store or overwrite the token bound to `session_id`.
    fn bind(&self, session_id: &str, token: &str);

    /// Look up the token bound to `session_id`.
    fn resolve(&self, session_id: &str) -> Option<String>;

    /// Remove the binding for `session_id`. Returns whether one existed.
    fn unbind(&self, session_id: &str) -> bool;

    /// Number of sessions currently holding a credential.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local credential store backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    bindings: DashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn bind(&self, session_id: &str, token: &str) {
        let replaced = self
            .bindings
            .insert(session_id.to_string(), token.to_string())
            .is_some();
        debug!(
            "Credential bound for session {} (replaced previous: {})",
            session_id, replaced
        );
    }

    fn resolve(&self, session_id: &str) -> Option<String> {
        self.bindings.get(session_id).map(|entry| entry.value().clone())
    }

    fn unbind(&self, session_id: &str) -> bool {
        match self.bindings.remove(session_id) {
            Some(_) => {
                debug!("Credential removed for session {}", session_id);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.bindings.len()
    }
}
