//! User Tools
//!
//! Profile of the calling user and the user directory.

use serde_json::Value;

use super::format::{field, items, permissions_line};
use super::{empty_schema, NoArguments};
use crate::backend::endpoints;
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register user tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(get_user_profile_tool())?;
    registry.register_tool(get_users_tool())?;
    Ok(())
}

// ============================================================================
// get-user-profile
// ============================================================================

fn get_user_profile_tool() -> RegisteredTool {
    ToolBuilder::new("get-user-profile")
        .description(
            "Fetches the profile of the logged in user, including the restaurants \
             they belong to and their role in each",
        )
        .input_schema(empty_schema())
        .build(get_user_profile)
}

async fn get_user_profile(call: AuthorizedCall, _params: NoArguments) -> ToolResult {
    call.info("Fetching your user profile data...").await;

    let body = call
        .backend()
        .get(&call.url(endpoints::USER_ME), &call.token)
        .await
        .map_err(ToolError::backend("fetch user profile"))?;

    let user = body.field("user").filter(|u| u.is_object()).ok_or_else(|| {
        ToolError::DomainFailure("Error: Could not retrieve user data from the server".into())
    })?;

    Ok(ToolsCallResult::text(render_profile(user)))
}

pub(crate) fn render_profile(user: &Value) -> String {
    let memberships = items(user.get("restaurants"));
    let restaurants = if memberships.is_empty() {
        "No restaurants found".to_string()
    } else {
        memberships
            .iter()
            .map(|entry| {
                let restaurant = entry.get("restaurant").unwrap_or(&Value::Null);
                let role = entry.get("role").unwrap_or(&Value::Null);
                format!(
                    "Restaurant: {}\nID: {}\nRole: {}\nPermissions: {}",
                    field(restaurant, "name"),
                    field(restaurant, "id"),
                    field(role, "name"),
                    permissions_line(role)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "User Profile Information:\n\nName: {}\nEmail: {}\nID: {}\n\n--- Restaurants ---\n{}",
        field(user, "name"),
        field(user, "email"),
        field(user, "id"),
        restaurants
    )
}

// ============================================================================
// get-users
// ============================================================================

fn get_users_tool() -> RegisteredTool {
    ToolBuilder::new("get-users")
        .description("Lists every user known to the restaurant platform")
        .input_schema(empty_schema())
        .build(get_users)
}

async fn get_users(call: AuthorizedCall, _params: NoArguments) -> ToolResult {
    call.info("Fetching users...").await;

    let body = call
        .backend()
        .get(&call.url(endpoints::GENERAL_USERS), &call.token)
        .await
        .map_err(ToolError::backend("fetch users"))?;

    let users = items(body.field("users"));
    if users.is_empty() {
        return Ok(ToolsCallResult::text("No users found."));
    }

    ToolsCallResult::json(&users).map_err(ToolError::from)
}
