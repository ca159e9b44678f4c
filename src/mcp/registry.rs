//! MCP Tool, Resource and Prompt Registry
//!
//! Everything is registered once at startup. Tool names are unique and
//! input schemas are compiled at registration, so a bad schema or a
//! duplicate name is reported before the server accepts any traffic.

use std::collections::{BTreeMap, HashMap};
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::context::{AuthorizedCall, ToolContext};
use super::error::{RegistryError, ToolError};
use super::protocol::{
    McpError, PromptArgument, PromptDefinition, PromptsGetResult, ResourceContent,
    ResourceDefinition, ToolDefinition, ToolsCallResult,
};
use super::validation::{decode_arguments, ArgumentSchema};

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolsCallResult, ToolError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Type-erased tool handler. Receives arguments that already passed schema
/// validation.
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// Whether a tool needs the session's credential before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAccess {
    Credentialed,
    Public,
}

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub access: ToolAccess,
    pub handler: ToolHandler,
}

struct CompiledTool {
    tool: RegisteredTool,
    schema: ArgumentSchema,
}

// ============================================================================
// Resource Types
// ============================================================================

/// Result type for resource read
pub type ResourceResult = Result<Vec<ResourceContent>, McpError>;

/// Boxed future for async resource read
pub type ResourceFuture = Pin<Box<dyn Future<Output = ResourceResult> + Send>>;

/// A read against a concrete URI, with the pattern's placeholders filled in.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub uri: String,
    pub params: HashMap<String, String>,
}

/// Resource handler function type
pub type ResourceHandler = Arc<dyn Fn(ToolContext, ResourceRequest) -> ResourceFuture + Send + Sync>;

/// A registered resource with metadata and handler
pub struct RegisteredResource {
    pub uri_pattern: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub handler: ResourceHandler,
}

// ============================================================================
// Prompt Types
// ============================================================================

pub type PromptHandler =
    Arc<dyn Fn(&HashMap<String, String>) -> PromptsGetResult + Send + Sync>;

pub struct RegisteredPrompt {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub handler: PromptHandler,
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
pub struct McpRegistry {
    tools: BTreeMap<String, CompiledTool>,
    resources: Vec<RegisteredResource>,
    prompts: BTreeMap<String, RegisteredPrompt>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, compiling its input schema.
    pub fn register_tool(&mut self, tool: RegisteredTool) -> Result<(), RegistryError> {
        if self.tools.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateTool(tool.name));
        }

        let schema = ArgumentSchema::compile(tool.input_schema.clone()).map_err(|reason| {
            RegistryError::InvalidSchema {
                tool: tool.name.clone(),
                reason,
            }
        })?;

        self.tools
            .insert(tool.name.clone(), CompiledTool { tool, schema });
        Ok(())
    }

    /// Register a resource
    pub fn register_resource(&mut self, resource: RegisteredResource) -> Result<(), RegistryError> {
        if self
            .resources
            .iter()
            .any(|r| r.uri_pattern == resource.uri_pattern)
        {
            return Err(RegistryError::DuplicateResource(resource.uri_pattern));
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn register_prompt(&mut self, prompt: RegisteredPrompt) -> Result<(), RegistryError> {
        if self.prompts.contains_key(&prompt.name) {
            return Err(RegistryError::DuplicatePrompt(prompt.name));
        }
        self.prompts.insert(prompt.name.clone(), prompt);
        Ok(())
    }

    /// Definitions of every registered tool, ordered by name
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|compiled| ToolDefinition {
                name: compiled.tool.name.clone(),
                description: compiled.tool.description.clone(),
                input_schema: compiled.schema.schema().clone(),
            })
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name).map(|compiled| &compiled.tool)
    }

    /// Run a tool.
    ///
    /// Only an unknown tool name is a protocol error. Every failure after
    /// that point is folded into an error-flagged result.
    pub async fn call_tool(
        &self,
        name: &str,
        ctx: ToolContext,
        arguments: Value,
    ) -> Result<ToolsCallResult, McpError> {
        let compiled = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {}", name)))?;

        debug!(
            "Calling tool {} (session: {:?})",
            name,
            ctx.session_id.as_deref()
        );

        let outcome = match compiled.schema.check(&arguments) {
            Ok(()) => (compiled.tool.handler)(ctx, arguments).await,
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed ({}): {}", name, e.kind(), e);
                ToolsCallResult::error(e.to_string())
            }
        })
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.resources
            .iter()
            .map(|resource| ResourceDefinition {
                uri: resource.uri_pattern.clone(),
                name: resource.name.clone(),
                description: resource.description.clone(),
                mime_type: resource.mime_type.clone(),
            })
            .collect()
    }

    /// Read the first resource whose pattern matches `uri`.
    pub async fn read_resource(&self, uri: &str, ctx: ToolContext) -> ResourceResult {
        let (resource, params) = self
            .resources
            .iter()
            .find_map(|resource| {
                extract_uri_params(&resource.uri_pattern, uri).map(|params| (resource, params))
            })
            .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

        let request = ResourceRequest {
            uri: uri.to_string(),
            params,
        };
        (resource.handler)(ctx, request).await
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.prompts
            .values()
            .map(|prompt| PromptDefinition {
                name: prompt.name.clone(),
                description: prompt.description.clone(),
                arguments: prompt.arguments.clone(),
            })
            .collect()
    }

    pub fn get_prompt(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<PromptsGetResult, McpError> {
        let prompt = self
            .prompts
            .get(name)
            .ok_or_else(|| McpError::InvalidParams(format!("Unknown prompt: {}", name)))?;

        if let Some(missing) = prompt
            .arguments
            .iter()
            .find(|arg| arg.required && !arguments.contains_key(&arg.name))
        {
            return Err(McpError::InvalidParams(format!(
                "Missing required argument '{}' for prompt {}",
                missing.name, name
            )));
        }

        Ok((prompt.handler)(arguments))
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Get the number of registered resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }
}

/// Match `uri` against a pattern with `{param}` placeholders, returning the
/// captured values.
fn extract_uri_params(pattern: &str, uri: &str) -> Option<HashMap<String, String>> {
    // Pattern: restaurant://restaurants/{restaurantId}/tables
    // URI: restaurant://restaurants/7/tables

    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let uri_parts: Vec<&str> = uri.split('/').collect();

    if pattern_parts.len() != uri_parts.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (pattern_part, uri_part) in pattern_parts.iter().zip(uri_parts.iter()) {
        if let Some(name) = pattern_part
            .strip_prefix('{')
            .and_then(|p| p.strip_suffix('}'))
        {
            if uri_part.is_empty() {
                return None;
            }
            params.insert(name.to_string(), uri_part.to_string());
            continue;
        }
        if pattern_part != uri_part {
            return None;
        }
    }

    Some(params)
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Object schemas are closed unless they set `additionalProperties`
    /// themselves, so misspelled or unsupported arguments are rejected
    /// instead of silently dropped.
    pub fn input_schema(mut self, mut schema: Value) -> Self {
        if let Some(fields) = schema.as_object_mut() {
            fields
                .entry("additionalProperties")
                .or_insert(Value::Bool(false));
        }
        self.input_schema = schema;
        self
    }

    /// Build a tool that runs with the session's credential.
    ///
    /// Arguments are decoded into `P`, then the credential is resolved.
    /// The handler is never called when either step fails.
    pub fn build<P, F, Fut>(self, handler: F) -> RegisteredTool
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(AuthorizedCall, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let erased = move |ctx: ToolContext, arguments: Value| -> ToolFuture {
            let prepared = decode_arguments::<P>(arguments)
                .and_then(|params| ctx.resolve_credential().map(|token| (params, token)));

            match prepared {
                Ok((params, token)) => Box::pin(handler(AuthorizedCall { ctx, token }, params)),
                Err(e) => Box::pin(future::ready(Err(e))),
            }
        };

        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            access: ToolAccess::Credentialed,
            handler: Arc::new(erased),
        }
    }

    /// Build a tool that needs no credential.
    pub fn build_public<P, F, Fut>(self, handler: F) -> RegisteredTool
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(ToolContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let erased = move |ctx: ToolContext, arguments: Value| -> ToolFuture {
            match decode_arguments::<P>(arguments) {
                Ok(params) => Box::pin(handler(ctx, params)),
                Err(e) => Box::pin(future::ready(Err(e))),
            }
        };

        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            access: ToolAccess::Public,
            handler: Arc::new(erased),
        }
    }
}

/// Builder for registering a resource
pub struct ResourceBuilder {
    uri_pattern: String,
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
}

impl ResourceBuilder {
    pub fn new(uri_pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri_pattern: uri_pattern.into(),
            name: name.into(),
            description: None,
            mime_type: None,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredResource
    where
        F: Fn(ToolContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResourceResult> + Send + 'static,
    {
        RegisteredResource {
            uri_pattern: self.uri_pattern,
            name: self.name,
            description: self.description,
            mime_type: self.mime_type,
            handler: Arc::new(move |ctx, request| Box::pin(handler(ctx, request))),
        }
    }
}

/// Builder for registering a prompt
pub struct PromptBuilder {
    name: String,
    description: String,
    arguments: Vec<PromptArgument>,
}

impl PromptBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            arguments: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn argument(mut self, name: &str, description: &str, required: bool) -> Self {
        self.arguments.push(PromptArgument {
            name: name.to_string(),
            description: description.to_string(),
            required,
        });
        self
    }

    pub fn build<F>(self, handler: F) -> RegisteredPrompt
    where
        F: Fn(&HashMap<String, String>) -> PromptsGetResult + Send + Sync + 'static,
    {
        RegisteredPrompt {
            name: self.name,
            description: self.description,
            arguments: self.arguments,
            handler: Arc::new(handler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, InMemoryCredentialStore};
    use crate::backend::BackendClient;
    use crate::mcp::notifier::Notifier;
    use crate::mcp::protocol::PromptMessage;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(session_id: Option<&str>, store: Arc<dyn CredentialStore>) -> ToolContext {
        ToolContext {
            session_id: session_id.map(str::to_string),
            notifier: Notifier::detached(),
            credentials: store,
            backend: Arc::new(BackendClient::new("http://localhost:9", None).unwrap()),
        }
    }

    #[derive(Deserialize)]
    struct EchoParams {
        name: String,
    }

    fn echo_tool(calls: Arc<AtomicUsize>) -> RegisteredTool {
        ToolBuilder::new("echo")
            .description("Echo the name and the token")
            .input_schema(json!({
                "type": "object",
                "properties": { "name": { "type": "string", "minLength": 3 } },
                "required": ["name"]
            }))
            .build(move |call: AuthorizedCall, params: EchoParams| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ToolsCallResult::text(format!("{} {}", params.name, call.token)))
                }
            })
    }

    #[test]
    fn test_uri_pattern_matching_exact() {
        assert!(extract_uri_params("restaurant://me/profile", "restaurant://me/profile").is_some());
        assert!(extract_uri_params("restaurant://me/profile", "restaurant://me/other").is_none());
    }

    #[test]
    fn test_uri_pattern_matching_with_param() {
        let params = extract_uri_params(
            "restaurant://restaurants/{restaurantId}/tables",
            "restaurant://restaurants/7/tables",
        )
        .unwrap();
        assert_eq!(params.get("restaurantId").map(String::as_str), Some("7"));

        assert!(extract_uri_params(
            "restaurant://restaurants/{restaurantId}/tables",
            "restaurant://restaurants/7/roles"
        )
        .is_none());
    }

    #[test]
    fn test_uri_pattern_matching_different_lengths() {
        assert!(extract_uri_params(
            "restaurant://restaurants/{restaurantId}/tables",
            "restaurant://restaurants/7"
        )
        .is_none());
        assert!(extract_uri_params(
            "restaurant://restaurants/{restaurantId}/tables",
            "restaurant://restaurants//tables"
        )
        .is_none());
    }

    #[test]
    fn test_duplicate_tool_is_rejected() {
        let mut registry = McpRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry.register_tool(echo_tool(calls.clone())).unwrap();

        let err = registry.register_tool(echo_tool(calls)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.tool_count(), 1);
    }

    #[test]
    fn test_invalid_schema_is_rejected_at_registration() {
        let mut registry = McpRegistry::new();
        let tool = ToolBuilder::new("broken")
            .input_schema(json!({ "type": 5 }))
            .build_public(|_ctx, _params: Value| async { Ok(ToolsCallResult::text("never")) });

        assert!(matches!(
            registry.register_tool(tool),
            Err(RegistryError::InvalidSchema { .. })
        ));
    }

    #[tokio::test]
    async fn test_call_runs_handler_with_bound_token() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.bind("s-1", "tok");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = McpRegistry::new();
        registry.register_tool(echo_tool(calls.clone())).unwrap();

        let result = registry
            .call_tool("echo", ctx(Some("s-1"), store), json!({"name": "Luna"}))
            .await
            .unwrap();

        assert!(!result.is_error());
        assert_eq!(result.joined_text(), "Luna tok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.bind("s-1", "tok");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = McpRegistry::new();
        registry.register_tool(echo_tool(calls.clone())).unwrap();

        let result = registry
            .call_tool("echo", ctx(Some("s-1"), store), json!({"name": "ab"}))
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.joined_text().starts_with("Invalid arguments: name: "));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_argument_is_rejected() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.bind("s-1", "tok");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = McpRegistry::new();
        registry.register_tool(echo_tool(calls.clone())).unwrap();

        let schema = &registry.get_tool("echo").unwrap().input_schema;
        assert_eq!(schema["additionalProperties"], json!(false));

        let result = registry
            .call_tool(
                "echo",
                ctx(Some("s-1"), store),
                json!({"name": "Luna", "nickname": "Lu"}),
            )
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.joined_text().contains("nickname"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_binding_skips_handler() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = McpRegistry::new();
        registry.register_tool(echo_tool(calls.clone())).unwrap();

        let result = registry
            .call_tool("echo", ctx(Some("s-1"), store.clone()), json!({"name": "Luna"}))
            .await
            .unwrap();
        assert!(result.is_error());
        assert!(result
            .joined_text()
            .contains("Authentication token not found"));

        let result = registry
            .call_tool("echo", ctx(None, store), json!({"name": "Luna"}))
            .await
            .unwrap();
        assert!(result.joined_text().contains("Could not determine session ID"));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let registry = McpRegistry::new();
        let store = Arc::new(InMemoryCredentialStore::new());
        let err = registry
            .call_tool("nope", ctx(None, store), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32601);
    }

    #[tokio::test]
    async fn test_public_tool_needs_no_session() {
        let mut registry = McpRegistry::new();
        registry
            .register_tool(
                ToolBuilder::new("hello").build_public(|_ctx, _params: Value| async {
                    Ok(ToolsCallResult::text("hi"))
                }),
            )
            .unwrap();
        assert_eq!(registry.get_tool("hello").unwrap().access, ToolAccess::Public);

        let store = Arc::new(InMemoryCredentialStore::new());
        let result = registry
            .call_tool("hello", ctx(None, store), json!({}))
            .await
            .unwrap();
        assert_eq!(result.joined_text(), "hi");
    }

    #[test]
    fn test_prompt_required_argument() {
        let mut registry = McpRegistry::new();
        registry
            .register_prompt(
                PromptBuilder::new("greet")
                    .argument("who", "Name", true)
                    .build(|args| PromptsGetResult {
                        description: "Greeting".to_string(),
                        messages: vec![PromptMessage::user(format!(
                            "Hi {}",
                            args.get("who").map(String::as_str).unwrap_or_default()
                        ))],
                    }),
            )
            .unwrap();

        assert!(registry.get_prompt("greet", &HashMap::new()).is_err());

        let args = HashMap::from([("who".to_string(), "Ana".to_string())]);
        let result = registry.get_prompt("greet", &args).unwrap();
        assert_eq!(result.messages.len(), 1);
    }
}
