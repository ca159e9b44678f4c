//! Restaurant Resources
//!
//! The caller's profile and the tables of a restaurant, as JSON.

use crate::backend::{endpoints, BackendError};
use crate::mcp::context::ToolContext;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::{McpError, ResourceContent};
use crate::mcp::registry::{
    McpRegistry, RegisteredResource, ResourceBuilder, ResourceRequest, ResourceResult,
};

const JSON_MIME: &str = "application/json";

/// Register restaurant resources with the registry
pub fn register_resources(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_resource(profile_resource())?;
    registry.register_resource(restaurant_tables_resource())?;
    Ok(())
}

fn credential(ctx: &ToolContext) -> Result<String, McpError> {
    ctx.resolve_credential().map_err(|e| match e {
        ToolError::MissingSession | ToolError::Unauthenticated => McpError::Unauthorized,
        other => McpError::InternalError(other.to_string()),
    })
}

fn backend_failure(e: BackendError) -> McpError {
    McpError::ToolExecutionFailed(e.to_string())
}

fn json_content(uri: String, value: &serde_json::Value) -> ResourceResult {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::InternalError(e.to_string()))?;
    Ok(vec![ResourceContent {
        uri,
        mime_type: Some(JSON_MIME.to_string()),
        text,
    }])
}

// ============================================================================
// restaurant://me/profile
// ============================================================================

fn profile_resource() -> RegisteredResource {
    ResourceBuilder::new("restaurant://me/profile", "User Profile")
        .description("Profile of the logged in user, including restaurant memberships")
        .mime_type(JSON_MIME)
        .build(profile_handler)
}

async fn profile_handler(ctx: ToolContext, request: ResourceRequest) -> ResourceResult {
    let token = credential(&ctx)?;

    let body = ctx
        .backend
        .get(&ctx.backend.url(endpoints::USER_ME), &token)
        .await
        .map_err(backend_failure)?;

    json_content(request.uri, &body.into_json())
}

// ============================================================================
// restaurant://restaurants/{restaurantId}/tables
// ============================================================================

fn restaurant_tables_resource() -> RegisteredResource {
    ResourceBuilder::new(
        "restaurant://restaurants/{restaurantId}/tables",
        "Restaurant Tables",
    )
    .description("Tables of a restaurant")
    .mime_type(JSON_MIME)
    .build(restaurant_tables_handler)
}

async fn restaurant_tables_handler(ctx: ToolContext, request: ResourceRequest) -> ResourceResult {
    let restaurant_id: i64 = request
        .params
        .get("restaurantId")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| {
            McpError::InvalidParams(format!("Invalid restaurant URI: {}", request.uri))
        })?;

    let token = credential(&ctx)?;

    let body = ctx
        .backend
        .get(
            &ctx.backend.url(&endpoints::tables_of_restaurant(restaurant_id)),
            &token,
        )
        .await
        .map_err(backend_failure)?;

    json_content(request.uri, &body.into_json())
}
