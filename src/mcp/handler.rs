//! MCP message handling shared by every transport.
//!
//! A transport parses a message, asks [`McpState::admit`] whether it may
//! proceed, then hands it to [`McpState::dispatch`] with a notifier wired
//! to wherever its notifications should go.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::context::ToolContext;
use super::error::RegistryError;
use super::notifier::Notifier;
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    PromptsCapability, PromptsGetParams, PromptsListResult, ResourcesCapability,
    ResourcesListResult, ResourcesReadParams, ResourcesReadResult, ServerCapabilities,
    ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult, JSONRPC_VERSION,
    MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;
use super::session::{SessionError, SessionManager};
use crate::auth::{AuthGate, CredentialStore, InboundEnvelope, HANDSHAKE_METHOD};
use crate::backend::BackendClient;

pub const SERVER_NAME: &str = "restaurant-mcp";

pub fn server_version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}

/// State shared across MCP sessions
pub struct McpState {
    pub registry: Arc<McpRegistry>,
    pub sessions: Arc<SessionManager>,
    pub credentials: Arc<dyn CredentialStore>,
    pub backend: Arc<BackendClient>,
    pub gate: Arc<AuthGate>,
}

/// Why a message was turned away before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Missing, expired or tampered token
    Unauthorized,
    /// No session id on a message that is not a handshake
    MissingSession,
    UnknownSession(String),
    /// The token belongs to another user than the session
    SubjectMismatch(String),
}

impl Rejection {
    pub fn error(&self) -> McpError {
        match self {
            Rejection::Unauthorized => McpError::Unauthorized,
            Rejection::MissingSession => {
                McpError::InvalidRequest("No valid session ID provided".to_string())
            }
            Rejection::UnknownSession(id) => McpError::SessionNotFound(id.clone()),
            Rejection::SubjectMismatch(_) => {
                McpError::PermissionDenied("session belongs to another user".to_string())
            }
        }
    }

    /// The error envelope sent back instead of a response.
    pub fn response(&self) -> McpResponse {
        McpResponse::error(None, self.error())
    }
}

/// A message cleared to run on `session_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub session_id: String,
    /// Whether admission opened the session
    pub opened: bool,
}

/// Parse one JSON-RPC message, or produce the parse error response.
pub fn parse_message(text: &str) -> Result<McpRequest, McpResponse> {
    let request: McpRequest = serde_json::from_str(text)
        .map_err(|e| McpResponse::error(None, McpError::ParseError(e.to_string())))?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpResponse::error(
            request.id,
            McpError::InvalidRequest(format!("Unsupported jsonrpc version {}", request.jsonrpc)),
        ));
    }
    Ok(request)
}

impl McpState {
    pub fn new(
        registry: McpRegistry,
        credentials: Arc<dyn CredentialStore>,
        backend: Arc<BackendClient>,
        gate: Arc<AuthGate>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            sessions: Arc::new(SessionManager::new(credentials.clone())),
            credentials,
            backend,
            gate,
        }
    }

    /// Run the gate for an inbound message.
    ///
    /// A handshake without a session id opens a new session. Anything else
    /// must name a live session and carry a valid token for its user.
    pub fn admit(
        &self,
        method: &str,
        authorization: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Admitted, Rejection> {
        let envelope = InboundEnvelope {
            authorization,
            session_id,
            method,
        };

        let Some(session_id) = session_id else {
            if method != HANDSHAKE_METHOD {
                debug!("Rejecting {} without session id", method);
                return Err(Rejection::MissingSession);
            }
            let auth = self
                .gate
                .authenticate(&envelope)
                .map_err(|_| Rejection::Unauthorized)?;
            return Ok(Admitted {
                session_id: self.sessions.open(&auth),
                opened: true,
            });
        };

        if !self.sessions.contains(session_id) {
            return Err(Rejection::UnknownSession(session_id.to_string()));
        }

        let auth = self
            .gate
            .authenticate(&envelope)
            .map_err(|_| Rejection::Unauthorized)?;

        match self
            .sessions
            .bind_if_owner(session_id, auth.subject.as_deref(), || {
                self.gate.bind(session_id, &auth)
            }) {
            Ok(()) => Ok(Admitted {
                session_id: session_id.to_string(),
                opened: false,
            }),
            Err(SessionError::NotFound(id)) => Err(Rejection::UnknownSession(id)),
            Err(SessionError::SubjectMismatch { session_id, .. }) => {
                self.sessions.terminate(&session_id);
                Err(Rejection::SubjectMismatch(session_id))
            }
        }
    }

    pub fn tool_context(&self, session_id: &str, notifier: Notifier) -> ToolContext {
        ToolContext {
            session_id: Some(session_id.to_string()),
            notifier,
            credentials: self.credentials.clone(),
            backend: self.backend.clone(),
        }
    }

    /// Handle an admitted message. Notifications never get a response.
    pub async fn dispatch(
        &self,
        request: McpRequest,
        session_id: &str,
        notifier: Notifier,
    ) -> Option<McpResponse> {
        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::INITIALIZED => {
                debug!("Session {} initialized", session_id);
                return None;
            }
            methods::PING => to_result(PingResult {}),
            methods::TOOLS_LIST => to_result(ToolsListResult {
                tools: self.registry.list_tools(),
            }),
            methods::TOOLS_CALL => self.handle_tools_call(&request, session_id, notifier).await,
            methods::RESOURCES_LIST => to_result(ResourcesListResult {
                resources: self.registry.list_resources(),
            }),
            methods::RESOURCES_READ => self.handle_resources_read(&request, session_id).await,
            methods::PROMPTS_LIST => to_result(PromptsListResult {
                prompts: self.registry.list_prompts(),
            }),
            methods::PROMPTS_GET => self.handle_prompts_get(&request),
            methods::SHUTDOWN => {
                debug!("Session {} is shutting down", session_id);
                Ok(json!({}))
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        let request_id = match request.id {
            Some(id) => id,
            None => {
                if let Err(e) = result {
                    debug!("Ignoring failed notification {}: {}", request.method, e.message());
                }
                return None;
            }
        };

        Some(match result {
            Ok(value) => McpResponse::success(request_id, value),
            Err(error) => McpResponse::error(Some(request_id), error),
        })
    }

    fn handle_initialize(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: Option<InitializeParams> = request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        if let Some(params) = params {
            info!(
                "MCP client {} {} connected (protocol {})",
                params.client_info.name, params.client_info.version, params.protocol_version
            );
        }

        to_result(InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: None,
                }),
                prompts: Some(PromptsCapability { list_changed: None }),
                logging: Some(json!({})),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: server_version(),
            },
        })
    }

    async fn handle_tools_call(
        &self,
        request: &McpRequest,
        session_id: &str,
        notifier: Notifier,
    ) -> Result<Value, McpError> {
        let params: ToolsCallParams = request.parse_params()?;
        let notifier = notifier.with_progress_token(params.progress_token());
        let ctx = self.tool_context(session_id, notifier);

        let arguments = match params.arguments {
            Some(Value::Null) | None => json!({}),
            Some(arguments) => arguments,
        };
        let result = self.registry.call_tool(&params.name, ctx, arguments).await?;

        to_result(result)
    }

    async fn handle_resources_read(
        &self,
        request: &McpRequest,
        session_id: &str,
    ) -> Result<Value, McpError> {
        let params: ResourcesReadParams = request.parse_params()?;
        let ctx = self.tool_context(session_id, Notifier::detached());

        let contents = self.registry.read_resource(&params.uri, ctx).await?;

        to_result(ResourcesReadResult { contents })
    }

    fn handle_prompts_get(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: PromptsGetParams = request.parse_params()?;
        let result = self.registry.get_prompt(&params.name, &params.arguments)?;
        to_result(result)
    }
}

fn to_result<T: serde::Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Create the MCP state with every tool, resource and prompt registered.
pub fn create_mcp_state(
    credentials: Arc<dyn CredentialStore>,
    backend: Arc<BackendClient>,
    gate: Arc<AuthGate>,
) -> Result<McpState, RegistryError> {
    let mut registry = McpRegistry::new();

    super::tools::register_all_tools(&mut registry)?;
    super::resources::register_all_resources(&mut registry)?;
    super::prompts::register_all_prompts(&mut registry)?;

    info!(
        "MCP registry initialized with {} tools, {} resources and {} prompts",
        registry.tool_count(),
        registry.resource_count(),
        registry.prompt_count()
    );

    if registry.tool_count() == 0 {
        warn!("No MCP tools registered");
    }

    Ok(McpState::new(registry, credentials, backend, gate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::tests::{mint, now_secs, SECRET};
    use crate::auth::{InMemoryCredentialStore, TokenValidator, UserId};
    use crate::mcp::protocol::RequestId;

    fn state() -> (McpState, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let gate = Arc::new(AuthGate::new(
            TokenValidator::new(SECRET, false),
            store.clone(),
        ));
        let backend = Arc::new(BackendClient::new("http://localhost:9", None).unwrap());
        let state = create_mcp_state(store.clone(), backend, gate).unwrap();
        (state, store)
    }

    fn token_for(user: i64) -> String {
        mint(SECRET, UserId::Number(user), Some(now_secs() + 600))
    }

    fn request(id: Option<i64>, method: &str, params: Value) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: id.map(RequestId::Number),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[test]
    fn test_parse_error_response() {
        let response = parse_message("{not json").unwrap_err();
        assert_eq!(response.error.unwrap().code, -32700);
        assert!(response.id.is_none());
    }

    #[test]
    fn test_handshake_opens_session_and_binds_token() {
        let (state, store) = state();
        let token = token_for(1);
        let header = format!("Bearer {}", token);

        let admitted = state.admit("initialize", Some(&header), None).unwrap();
        assert!(admitted.opened);
        assert_eq!(store.resolve(&admitted.session_id), Some(token));
    }

    #[test]
    fn test_anonymous_handshake_then_tools_need_token() {
        let (state, _) = state();
        let admitted = state.admit("initialize", None, None).unwrap();

        assert_eq!(
            state.admit("tools/list", None, Some(&admitted.session_id)),
            Err(Rejection::Unauthorized)
        );

        let token = token_for(1);
        assert!(state
            .admit("tools/list", Some(&token), Some(&admitted.session_id))
            .is_ok());
    }

    #[test]
    fn test_non_handshake_without_session_rejected() {
        let (state, _) = state();
        let token = token_for(1);
        assert_eq!(
            state.admit("tools/list", Some(&token), None),
            Err(Rejection::MissingSession)
        );
    }

    #[test]
    fn test_unknown_session_rejected_without_binding() {
        let (state, store) = state();
        let token = token_for(1);
        assert_eq!(
            state.admit("tools/list", Some(&token), Some("ghost")),
            Err(Rejection::UnknownSession("ghost".to_string()))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_subject_mismatch_terminates_session() {
        let (state, store) = state();
        let first = token_for(1);
        let admitted = state.admit("initialize", Some(&first), None).unwrap();
        let id = admitted.session_id;

        let other = token_for(2);
        assert_eq!(
            state.admit("tools/list", Some(&other), Some(&id)),
            Err(Rejection::SubjectMismatch(id.clone()))
        );
        assert!(!state.sessions.contains(&id));
        assert!(store.resolve(&id).is_none());
    }

    /// Remembers every token ever bound, on top of an in-memory store.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryCredentialStore,
        bound: std::sync::Mutex<Vec<String>>,
    }

    impl CredentialStore for RecordingStore {
        fn bind(&self, session_id: &str, token: &str) {
            self.bound.lock().unwrap().push(token.to_string());
            self.inner.bind(session_id, token);
        }

        fn resolve(&self, session_id: &str) -> Option<String> {
            self.inner.resolve(session_id)
        }

        fn unbind(&self, session_id: &str) -> bool {
            self.inner.unbind(session_id)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn recording_state() -> (McpState, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        let gate = Arc::new(AuthGate::new(
            TokenValidator::new(SECRET, false),
            store.clone(),
        ));
        let backend = Arc::new(BackendClient::new("http://localhost:9", None).unwrap());
        let state = create_mcp_state(store.clone(), backend, gate).unwrap();
        (state, store)
    }

    #[test]
    fn test_other_users_token_never_reaches_the_store() {
        let (state, store) = recording_state();
        let first = token_for(1);
        let id = state
            .admit("initialize", Some(&first), None)
            .unwrap()
            .session_id;

        let other = token_for(2);
        assert_eq!(
            state.admit("tools/call", Some(&other), Some(&id)),
            Err(Rejection::SubjectMismatch(id.clone()))
        );

        assert!(!store.bound.lock().unwrap().contains(&other));
        assert!(store.resolve(&id).is_none());
    }

    #[test]
    fn test_terminated_session_keeps_no_binding() {
        let (state, store) = recording_state();
        let token = token_for(1);
        let id = state
            .admit("initialize", Some(&token), None)
            .unwrap()
            .session_id;
        state.sessions.terminate(&id);

        assert_eq!(
            state.admit("tools/list", Some(&token), Some(&id)),
            Err(Rejection::UnknownSession(id.clone()))
        );
        assert!(store.resolve(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_rejection_envelopes() {
        let value = serde_json::to_value(Rejection::Unauthorized.response()).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "error": { "code": -32001, "message": "Invalid or missing token" },
                "id": null
            })
        );
        assert_eq!(Rejection::MissingSession.error().code(), -32600);
        assert_eq!(
            Rejection::UnknownSession("x".to_string()).error().code(),
            -32006
        );
        assert_eq!(
            Rejection::SubjectMismatch("x".to_string()).error().code(),
            -32002
        );
    }

    #[tokio::test]
    async fn test_initialize_result() {
        let (state, _) = state();
        let response = state
            .dispatch(
                request(
                    Some(1),
                    "initialize",
                    json!({
                        "protocolVersion": "2024-11-05",
                        "capabilities": {},
                        "clientInfo": { "name": "test", "version": "1" }
                    }),
                ),
                "s",
                Notifier::detached(),
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let (state, _) = state();
        let response = state
            .dispatch(
                request(None, "notifications/initialized", json!({})),
                "s",
                Notifier::detached(),
            )
            .await;
        assert!(response.is_none());

        let response = state
            .dispatch(
                request(None, "notifications/cancelled", json!({})),
                "s",
                Notifier::detached(),
            )
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (state, _) = state();
        let response = state
            .dispatch(request(Some(3), "bogus", json!({})), "s", Notifier::detached())
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
        assert_eq!(response.id, Some(RequestId::Number(3)));
    }

    #[tokio::test]
    async fn test_tools_list_contains_restaurant_tools() {
        let (state, _) = state();
        let response = state
            .dispatch(request(Some(2), "tools/list", json!({})), "s", Notifier::detached())
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].clone();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        for expected in [
            "create-restaurant",
            "create-table",
            "create-restaurant-user",
            "get-users",
            "get-user-profile",
            "change-user-role",
            "create-booking",
            "update-time-slot",
            "get-menu-dishes",
            "update-order-item-status",
            "start-notification-stream",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_tools_call_without_binding_is_tool_error() {
        let (state, _) = state();
        let response = state
            .dispatch(
                request(
                    Some(4),
                    "tools/call",
                    json!({ "name": "get-users", "arguments": {} }),
                ),
                "unbound",
                Notifier::detached(),
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Authentication token not found"));
    }

    #[tokio::test]
    async fn test_prompts_list_and_get() {
        let (state, _) = state();
        let response = state
            .dispatch(request(Some(5), "prompts/list", json!({})), "s", Notifier::detached())
            .await
            .unwrap();
        let prompts = response.result.unwrap()["prompts"].clone();
        assert_eq!(prompts.as_array().unwrap().len(), 4);

        let response = state
            .dispatch(
                request(
                    Some(6),
                    "prompts/get",
                    json!({ "name": "restaurant_greeting", "arguments": { "userName": "Ana" } }),
                ),
                "s",
                Notifier::detached(),
            )
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert!(result["messages"][0]["content"]["text"]
            .as_str()
            .unwrap()
            .contains("Ana"));
    }
}
