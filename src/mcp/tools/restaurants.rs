//! Restaurant Tools

use serde::Deserialize;
use serde_json::json;

use super::format::display;
use crate::backend::{endpoints, BackendBody};
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const RESTAURANT_CREATED: &str = "Restaurant created successfully";

/// Register restaurant tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_restaurant_tool())
}

// ============================================================================
// create-restaurant
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateRestaurantParams {
    name: String,
}

fn create_restaurant_tool() -> RegisteredTool {
    ToolBuilder::new("create-restaurant")
        .description("Creates a new restaurant with the specified name")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "minLength": 3,
                    "description": "Name of the restaurant (at least 3 characters)"
                }
            },
            "required": ["name"]
        }))
        .build(create_restaurant)
}

async fn create_restaurant(call: AuthorizedCall, params: CreateRestaurantParams) -> ToolResult {
    call.info(format!("Creating restaurant '{}'...", params.name))
        .await;

    let body = call
        .backend()
        .post(
            &call.url(endpoints::RESTAURANT_CREATE),
            &call.token,
            &json!({ "name": params.name }),
        )
        .await
        .map_err(ToolError::backend("create restaurant"))?;

    interpret_created(&params.name, &body).map(ToolsCallResult::text)
}

/// The backend answers either `{ restaurant: { id, .. } }` or `{ id }`.
fn interpret_created(name: &str, body: &BackendBody) -> Result<String, ToolError> {
    let id = body
        .field("restaurant")
        .and_then(|r| r.get("id"))
        .or_else(|| body.field("id"))
        .filter(|id| !id.is_null());

    if let Some(id) = id {
        return Ok(format!(
            "Successfully created restaurant: {} with ID: {}",
            name,
            display(Some(id))
        ));
    }

    match body.message() {
        Some(RESTAURANT_CREATED) => Ok(format!("Successfully created restaurant: {}", name)),
        Some(message) => Err(ToolError::DomainFailure(format!(
            "Failed to create restaurant: {}",
            message
        ))),
        None => Err(ToolError::DomainFailure(
            "Failed to create restaurant: Unknown status".to_string(),
        )),
    }
}
