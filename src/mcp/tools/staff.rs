//! Staff Tools
//!
//! Adding users to a restaurant and listing its staff.

use serde::Deserialize;
use serde_json::{json, Value};

use super::format::{field, permissions_line};
use crate::backend::endpoints;
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const USER_ADDED: &str = "User added to restaurant successfully";

/// Register staff tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_restaurant_user_tool())?;
    registry.register_tool(get_restaurant_users_tool())?;
    Ok(())
}

// ============================================================================
// create-restaurant-user
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRestaurantUserParams {
    email: String,
    restaurant_id: i64,
    role_id: i64,
}

fn create_restaurant_user_tool() -> RegisteredTool {
    ToolBuilder::new("create-restaurant-user")
        .description("Adds an existing user to a restaurant's staff with the given role")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "format": "email",
                    "pattern": "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$",
                    "description": "Email of the user to add"
                },
                "restaurantId": { "type": "integer", "description": "ID of the restaurant" },
                "roleId": { "type": "integer", "description": "ID of the role to assign" }
            },
            "required": ["email", "restaurantId", "roleId"]
        }))
        .build(create_restaurant_user)
}

async fn create_restaurant_user(
    call: AuthorizedCall,
    params: CreateRestaurantUserParams,
) -> ToolResult {
    call.info("Adding user to restaurant...").await;

    let body = call
        .backend()
        .post(
            &call.url(endpoints::RESTAURANT_USER_CREATE),
            &call.token,
            &json!({
                "email": params.email,
                "restaurantId": params.restaurant_id,
                "roleId": params.role_id,
            }),
        )
        .await
        .map_err(ToolError::backend("add user to restaurant"))?;

    match body.message() {
        Some(USER_ADDED) => Ok(ToolsCallResult::text(format!(
            "Successfully added user {} to restaurant with ID: {}",
            params.email, params.restaurant_id
        ))),
        other => Err(ToolError::DomainFailure(format!(
            "Failed to add user: {}",
            other.unwrap_or("Unknown status")
        ))),
    }
}

// ============================================================================
// get-restaurant-users
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_restaurant_users_tool() -> RegisteredTool {
    ToolBuilder::new("get-restaurant-users")
        .description("Lists the staff of a restaurant with their roles and permissions")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "restaurantId": { "type": "integer", "minimum": 1, "description": "ID of the restaurant" }
            },
            "required": ["restaurantId"]
        }))
        .build(get_restaurant_users)
}

async fn get_restaurant_users(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info("Fetching restaurant staff members...").await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::restaurant_users(params.restaurant_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch restaurant users"))?;

    let members = body
        .as_json()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if members.is_empty() {
        return Ok(ToolsCallResult::text("No users found for this restaurant."));
    }

    Ok(ToolsCallResult::text(format!(
        "Restaurant Staff ({} users):\n\n{}",
        members.len(),
        render_members(members)
    )))
}

fn render_members(members: &[Value]) -> String {
    members
        .iter()
        .map(|member| {
            let user = member.get("user").unwrap_or(&Value::Null);
            let role = member.get("role").unwrap_or(&Value::Null);
            format!(
                "- {} ({})\n  ID: {}\n  Role: {}\n  Permissions: {}",
                field(user, "name"),
                field(user, "email"),
                field(user, "id"),
                field(role, "name"),
                permissions_line(role)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
