//! Role Tools

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::format::{field, items, permissions_line};
use crate::backend::endpoints;
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const ROLE_CREATED: &str = "Role created successfully";

/// Register role tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_role_tool())?;
    registry.register_tool(update_role_permissions_tool())?;
    registry.register_tool(get_restaurant_roles_tool())?;
    registry.register_tool(change_user_role_tool())?;
    Ok(())
}

/// Schema of one `can*` permission flag.
fn flag(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

/// Properties of every permission flag a role carries.
fn permission_properties() -> Map<String, Value> {
    [
        ("canCreateRoles", "Whether the role may create other roles"),
        ("canManageTables", "Whether the role may manage tables"),
        ("canManageSlots", "Whether the role may manage time slots"),
        ("canManageStaff", "Whether the role may manage staff"),
        ("canManageMenu", "Whether the role may manage menus and dishes"),
        ("canManageOrders", "Whether the role may manage orders"),
    ]
    .into_iter()
    .map(|(name, description)| (name.to_string(), flag(description)))
    .collect()
}

// ============================================================================
// create-role
// ============================================================================

/// Forwarded to the backend as-is, so the field names match its contract.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoleParams {
    name: String,
    restaurant_id: i64,
    #[serde(default)]
    can_create_roles: bool,
    #[serde(default)]
    can_manage_tables: bool,
    #[serde(default)]
    can_manage_slots: bool,
    #[serde(default)]
    can_manage_staff: bool,
    #[serde(default)]
    can_manage_menu: bool,
    #[serde(default)]
    can_manage_orders: bool,
}

fn create_role_tool() -> RegisteredTool {
    let mut properties = permission_properties();
    properties.insert(
        "name".to_string(),
        json!({ "type": "string", "minLength": 1, "description": "Role name" }),
    );
    properties.insert(
        "restaurantId".to_string(),
        json!({ "type": "integer", "description": "ID of the restaurant" }),
    );

    ToolBuilder::new("create-role")
        .description("Creates a new role in a restaurant with the given permissions")
        .input_schema(json!({
            "type": "object",
            "properties": properties,
            "required": ["name", "restaurantId"]
        }))
        .build(create_role)
}

async fn create_role(call: AuthorizedCall, params: CreateRoleParams) -> ToolResult {
    call.info("Creating new role...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::ROLES_CREATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("create role"))?;

    match body.message() {
        Some(ROLE_CREATED) => {
            let id = body
                .field("role")
                .map(|role| field(role, "id"))
                .unwrap_or_else(|| "unknown".to_string());
            Ok(ToolsCallResult::text(format!(
                "Successfully created role \"{}\" with ID: {}",
                params.name, id
            )))
        }
        other => Err(ToolError::DomainFailure(format!(
            "Failed to create role: {}",
            other.unwrap_or("Unknown status")
        ))),
    }
}

// ============================================================================
// update-role-permissions
// ============================================================================

/// Only the flags the caller sets are sent; the rest keep their value.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRolePermissionsParams {
    role_id: i64,
    restaurant_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_create_roles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_manage_tables: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_manage_slots: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_manage_staff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_manage_menu: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_manage_orders: Option<bool>,
}

fn update_role_permissions_tool() -> RegisteredTool {
    let mut properties = permission_properties();
    properties.insert(
        "roleId".to_string(),
        json!({ "type": "integer", "minimum": 1, "description": "ID of the role" }),
    );
    properties.insert(
        "restaurantId".to_string(),
        json!({ "type": "integer", "minimum": 1, "description": "ID of the restaurant" }),
    );

    ToolBuilder::new("update-role-permissions")
        .description("Updates permissions for an existing role")
        .input_schema(json!({
            "type": "object",
            "properties": properties,
            "required": ["roleId", "restaurantId"]
        }))
        .build(update_role_permissions)
}

async fn update_role_permissions(
    call: AuthorizedCall,
    params: UpdateRolePermissionsParams,
) -> ToolResult {
    call.info("Updating role permissions...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::ROLES_UPDATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("update role permissions"))?;

    if body.field("success").and_then(Value::as_bool) == Some(true) {
        Ok(ToolsCallResult::text(format!(
            "Successfully updated role permissions for role ID: {}",
            params.role_id
        )))
    } else {
        Err(ToolError::DomainFailure(format!(
            "Failed to update role permissions: {}",
            body.message().unwrap_or("Unknown error")
        )))
    }
}

// ============================================================================
// get-restaurant-roles
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_restaurant_roles_tool() -> RegisteredTool {
    ToolBuilder::new("get-restaurant-roles")
        .description("Fetches all roles defined for a restaurant")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "restaurantId": { "type": "integer", "minimum": 1, "description": "ID of the restaurant" }
            },
            "required": ["restaurantId"]
        }))
        .build(get_restaurant_roles)
}

async fn get_restaurant_roles(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info("Fetching restaurant roles...").await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::restaurant_roles(params.restaurant_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch restaurant roles"))?;

    let roles = items(body.field("roles"));
    if roles.is_empty() {
        return Ok(ToolsCallResult::text("No roles found for this restaurant."));
    }

    let listing = roles
        .iter()
        .map(|role| {
            format!(
                "- {} (ID: {})\n  Permissions: {}",
                field(role, "name"),
                field(role, "id"),
                permissions_line(role)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Restaurant Roles ({} total):\n\n{}",
        roles.len(),
        listing
    )))
}

// ============================================================================
// change-user-role
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeUserRoleParams {
    user_id: i64,
    restaurant_id: i64,
    new_role_id: i64,
}

fn change_user_role_tool() -> RegisteredTool {
    let id = |description: &str| json!({ "type": "integer", "minimum": 1, "description": description });

    ToolBuilder::new("change-user-role")
        .description("Changes a user's role within a restaurant")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "userId": id("ID of the user"),
                "restaurantId": id("ID of the restaurant"),
                "newRoleId": id("ID of the role to assign")
            },
            "required": ["userId", "restaurantId", "newRoleId"]
        }))
        .build(change_user_role)
}

async fn change_user_role(call: AuthorizedCall, params: ChangeUserRoleParams) -> ToolResult {
    call.info("Changing user role...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::ROLES_CHANGE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("change user role"))?;

    if let Some(role) = body.field("role").filter(|r| r.is_object()) {
        return Ok(ToolsCallResult::text(format!(
            "Successfully changed user's role to \"{}\" (ID: {})",
            field(role, "name"),
            field(role, "id")
        )));
    }

    match body.message() {
        Some(message) => Err(ToolError::DomainFailure(format!(
            "Failed to change user role: {}",
            message
        ))),
        None => Ok(ToolsCallResult::text(
            "User role has been changed successfully.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::testing::{authorized_call, bound_context, spawn_backend};
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_role_payload_uses_backend_field_names() {
        let params: CreateRoleParams = serde_json::from_value(json!({
            "name": "Host",
            "restaurantId": 42,
            "canManageTables": true
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "name": "Host",
                "restaurantId": 42,
                "canCreateRoles": false,
                "canManageTables": true,
                "canManageSlots": false,
                "canManageStaff": false,
                "canManageMenu": false,
                "canManageOrders": false
            })
        );
    }

    #[tokio::test]
    async fn test_create_role_reports_id() {
        let base = spawn_backend(Router::new().route(
            "/roles/create",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "message": ROLE_CREATED, "role": { "id": 8, "name": body["name"] } }))
            }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let params: CreateRoleParams =
            serde_json::from_value(json!({ "name": "Host", "restaurantId": 42 })).unwrap();
        let result = create_role(call, params).await.unwrap();
        assert_eq!(
            result.joined_text(),
            "Successfully created role \"Host\" with ID: 8"
        );
    }

    #[tokio::test]
    async fn test_get_restaurant_roles_lists_permissions() {
        let base = spawn_backend(Router::new().route(
            "/roles/getRoles/{id}",
            get(|| async {
                Json(json!({ "roles": [
                    { "id": 1, "name": "Owner", "canManageStaff": true, "canCreateRoles": true },
                    { "id": 2, "name": "Guest" }
                ] }))
            }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let result = get_restaurant_roles(call, RestaurantParams { restaurant_id: 42 })
            .await
            .unwrap();
        let text = result.joined_text();
        assert!(text.starts_with("Restaurant Roles (2 total):"));
        assert!(text.contains("- Owner (ID: 1)\n  Permissions: CreateRoles, ManageStaff"));
        assert!(text.contains("- Guest (ID: 2)\n  Permissions: None"));
    }

    #[tokio::test]
    async fn test_create_role_forwards_menu_and_order_flags() {
        let received = Arc::new(Mutex::new(Value::Null));
        let sink = received.clone();
        let base = spawn_backend(Router::new().route(
            "/roles/create",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = body;
                    Json(json!({ "message": ROLE_CREATED, "role": { "id": 3 } }))
                }
            }),
        ))
        .await;
        let mut registry = McpRegistry::new();
        register_tools(&mut registry).unwrap();

        let (ctx, _rx) = bound_context(&base);
        let result = registry
            .call_tool(
                "create-role",
                ctx,
                json!({
                    "name": "Chef",
                    "restaurantId": 1,
                    "canManageMenu": true,
                    "canManageOrders": true
                }),
            )
            .await
            .unwrap();

        assert!(!result.is_error(), "{}", result.joined_text());
        let body = received.lock().unwrap().clone();
        assert_eq!(body["canManageMenu"], json!(true));
        assert_eq!(body["canManageOrders"], json!(true));
        assert_eq!(body["canManageStaff"], json!(false));
    }

    #[tokio::test]
    async fn test_create_role_rejects_unknown_permission() {
        let mut registry = McpRegistry::new();
        register_tools(&mut registry).unwrap();

        let (ctx, _rx) = bound_context("http://localhost:9");
        let result = registry
            .call_tool(
                "create-role",
                ctx,
                json!({ "name": "Chef", "restaurantId": 1, "canFly": true }),
            )
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.joined_text().contains("canFly"));
    }

    #[tokio::test]
    async fn test_update_role_permissions_sends_only_given_flags() {
        let received = Arc::new(Mutex::new(Value::Null));
        let sink = received.clone();
        let base = spawn_backend(Router::new().route(
            "/roles/update",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = body;
                    Json(json!({ "success": true }))
                }
            }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let params: UpdateRolePermissionsParams = serde_json::from_value(json!({
            "roleId": 5,
            "restaurantId": 1,
            "canManageMenu": true
        }))
        .unwrap();
        let result = update_role_permissions(call, params).await.unwrap();

        assert_eq!(
            result.joined_text(),
            "Successfully updated role permissions for role ID: 5"
        );
        assert_eq!(
            *received.lock().unwrap(),
            json!({ "roleId": 5, "restaurantId": 1, "canManageMenu": true })
        );
    }

    #[tokio::test]
    async fn test_update_role_permissions_failure_uses_backend_message() {
        let base = spawn_backend(Router::new().route(
            "/roles/update",
            post(|| async { Json(json!({ "success": false, "message": "Role not found" })) }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let params: UpdateRolePermissionsParams =
            serde_json::from_value(json!({ "roleId": 5, "restaurantId": 1 })).unwrap();
        let err = update_role_permissions(call, params).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to update role permissions: Role not found"
        );
    }

    #[tokio::test]
    async fn test_change_user_role_outcomes() {
        let base = spawn_backend(Router::new().route(
            "/roles/change",
            post(|Json(body): Json<Value>| async move {
                match body["newRoleId"].as_i64() {
                    Some(2) => Json(json!({ "role": { "id": 2, "name": "Waiter" } })),
                    Some(3) => Json(json!({ "message": "User not in restaurant" })),
                    _ => Json(json!({})),
                }
            }),
        ))
        .await;
        let params = |new_role_id| ChangeUserRoleParams {
            user_id: 7,
            restaurant_id: 1,
            new_role_id,
        };

        let (call, _rx) = authorized_call(&base);
        let changed = change_user_role(call, params(2)).await.unwrap();
        assert_eq!(
            changed.joined_text(),
            "Successfully changed user's role to \"Waiter\" (ID: 2)"
        );

        let (call, _rx) = authorized_call(&base);
        let refused = change_user_role(call, params(3)).await.unwrap_err();
        assert_eq!(
            refused.to_string(),
            "Failed to change user role: User not in restaurant"
        );

        let (call, _rx) = authorized_call(&base);
        let silent = change_user_role(call, params(4)).await.unwrap();
        assert_eq!(
            silent.joined_text(),
            "User role has been changed successfully."
        );
    }
}
