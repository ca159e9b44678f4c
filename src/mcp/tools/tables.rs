//! Table Tools
//!
//! Create, list, inspect, update and delete the tables of a restaurant.

use serde::Deserialize;
use serde_json::{json, Value};

use super::format::{field, items, table_details};
use crate::backend::{endpoints, BackendBody};
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const TABLE_CREATED: &str = "table created successfully";
const TABLE_UPDATED: &str = "Table updated successfully";
const TABLE_DELETED: &str = "Table deleted successfully";

/// Register table tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_table_tool())?;
    registry.register_tool(get_restaurant_tables_tool())?;
    registry.register_tool(get_table_details_tool())?;
    registry.register_tool(update_table_tool())?;
    registry.register_tool(delete_table_tool())?;
    Ok(())
}

fn id_schema(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "description": description })
}

/// The `table` object of a body whose `message` is `expected`.
fn confirmed_table<'a>(body: &'a BackendBody, expected: &str) -> Option<&'a Value> {
    if body.message() == Some(expected) {
        body.field("table").filter(|t| t.is_object())
    } else {
        None
    }
}

fn status_of(body: &BackendBody) -> &str {
    body.message().unwrap_or("Unknown status")
}

// ============================================================================
// create-table
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTableParams {
    restaurant_id: i64,
    name: String,
    capacity: i64,
}

fn create_table_tool() -> RegisteredTool {
    ToolBuilder::new("create-table")
        .description("Creates a new table in a restaurant with specified capacity")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "restaurantId": { "type": "integer", "description": "ID of the restaurant" },
                "name": { "type": "string", "minLength": 1, "description": "Table name" },
                "capacity": { "type": "integer", "minimum": 1, "description": "Number of seats" }
            },
            "required": ["restaurantId", "name", "capacity"]
        }))
        .build(create_table)
}

async fn create_table(call: AuthorizedCall, params: CreateTableParams) -> ToolResult {
    call.info(format!(
        "Creating table '{}' with capacity {} for restaurant ID: {}...",
        params.name, params.capacity, params.restaurant_id
    ))
    .await;

    let body = call
        .backend()
        .post(
            &call.url(endpoints::TABLES_CREATE),
            &call.token,
            &json!({
                "restaurantId": params.restaurant_id,
                "name": params.name,
                "capacity": params.capacity,
            }),
        )
        .await
        .map_err(ToolError::backend("create table"))?;

    match confirmed_table(&body, TABLE_CREATED) {
        Some(table) => Ok(ToolsCallResult::text(format!(
            "Table created successfully!\n\nTable Details:\n{}",
            table_details(table)
        ))),
        None => Err(ToolError::DomainFailure(format!(
            "Table creation response: {}",
            status_of(&body)
        ))),
    }
}

// ============================================================================
// get-restaurant-tables
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_restaurant_tables_tool() -> RegisteredTool {
    ToolBuilder::new("get-restaurant-tables")
        .description("Fetches all tables for a specific restaurant")
        .input_schema(json!({
            "type": "object",
            "properties": { "restaurantId": id_schema("ID of the restaurant") },
            "required": ["restaurantId"]
        }))
        .build(get_restaurant_tables)
}

async fn get_restaurant_tables(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info(format!(
        "Fetching tables for restaurant ID: {}...",
        params.restaurant_id
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::tables_of_restaurant(params.restaurant_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch restaurant tables"))?;

    let tables = items(body.field("tables"));
    if tables.is_empty() {
        return Ok(ToolsCallResult::text("No tables found for this restaurant."));
    }

    let listing = tables
        .iter()
        .map(|t| {
            format!(
                "- {} (ID: {})\n  Capacity: {} people",
                field(t, "name"),
                field(t, "id"),
                field(t, "capacity")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Restaurant Tables ({} total):\n\n{}",
        tables.len(),
        listing
    )))
}

// ============================================================================
// get-table-details
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableParams {
    table_id: i64,
}

fn get_table_details_tool() -> RegisteredTool {
    ToolBuilder::new("get-table-details")
        .description("Fetches details for a specific table")
        .input_schema(json!({
            "type": "object",
            "properties": { "tableId": id_schema("ID of the table") },
            "required": ["tableId"]
        }))
        .build(get_table_details)
}

async fn get_table_details(call: AuthorizedCall, params: TableParams) -> ToolResult {
    call.info(format!("Fetching details for table ID: {}...", params.table_id))
        .await;

    let body = call
        .backend()
        .get(&call.url(&endpoints::table(params.table_id)), &call.token)
        .await
        .map_err(ToolError::backend("fetch table details"))?;

    let table = body
        .field("table")
        .filter(|t| t.is_object())
        .ok_or_else(|| ToolError::DomainFailure("Table not found.".to_string()))?;

    Ok(ToolsCallResult::text(format!(
        "Table Details:\n{}",
        table_details(table)
    )))
}

// ============================================================================
// update-table
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTableParams {
    table_id: i64,
    name: String,
    capacity: i64,
}

fn update_table_tool() -> RegisteredTool {
    ToolBuilder::new("update-table")
        .description("Updates an existing table's name and capacity")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "tableId": id_schema("ID of the table"),
                "name": { "type": "string", "minLength": 1, "description": "New table name" },
                "capacity": { "type": "integer", "minimum": 1, "description": "New number of seats" }
            },
            "required": ["tableId", "name", "capacity"]
        }))
        .build(update_table)
}

async fn update_table(call: AuthorizedCall, params: UpdateTableParams) -> ToolResult {
    call.info(format!("Updating table ID: {}...", params.table_id))
        .await;

    let body = call
        .backend()
        .put(
            &call.url(&endpoints::table(params.table_id)),
            &call.token,
            &json!({ "name": params.name, "capacity": params.capacity }),
        )
        .await
        .map_err(ToolError::backend("update table"))?;

    match confirmed_table(&body, TABLE_UPDATED) {
        Some(table) => Ok(ToolsCallResult::text(format!(
            "Table updated successfully!\n\n{}",
            table_details(table)
        ))),
        None => Err(ToolError::DomainFailure(format!(
            "Table update response: {}",
            status_of(&body)
        ))),
    }
}

// ============================================================================
// delete-table
// ============================================================================

fn delete_table_tool() -> RegisteredTool {
    ToolBuilder::new("delete-table")
        .description("Deletes a table from a restaurant")
        .input_schema(json!({
            "type": "object",
            "properties": { "tableId": id_schema("ID of the table") },
            "required": ["tableId"]
        }))
        .build(delete_table)
}

async fn delete_table(call: AuthorizedCall, params: TableParams) -> ToolResult {
    call.info(format!("Deleting table ID: {}...", params.table_id))
        .await;

    let body = call
        .backend()
        .delete(&call.url(&endpoints::table(params.table_id)), &call.token)
        .await
        .map_err(ToolError::backend("delete table"))?;

    if body.message() == Some(TABLE_DELETED) {
        Ok(ToolsCallResult::text(format!(
            "Table with ID {} has been successfully deleted.",
            params.table_id
        )))
    } else {
        Err(ToolError::DomainFailure(format!(
            "Table deletion response: {}",
            status_of(&body)
        )))
    }
}
