//! Credential handling for MCP sessions.
//!
//! - [`credential_store`]: session id -> bearer token bindings
//! - [`token`]: JWT verification
//! - [`gate`]: per-message admission (extract, validate, bind)

pub mod credential_store;
pub mod gate;
pub mod token;

pub use credential_store::{CredentialStore, InMemoryCredentialStore};
pub use gate::{AuthContext, AuthGate, GateError, InboundEnvelope, HANDSHAKE_METHOD};
pub use token::{Claims, TokenValidator, UserId};
