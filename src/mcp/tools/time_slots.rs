//! Time Slot Tools
//!
//! Open or close the half-hour slots in which a table can be booked.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::format::{date_field, field, items, long_date, slot_time};
use super::{date_schema, id_schema, slot_index_schema};
use crate::backend::endpoints;
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const SLOT_UPDATED: &str = "Time slot updated successfully";
const BATCH_UPDATED: &str = "Batch time slot update successful";
const SLOTS_RETRIEVED: &str = "Time slots retrieved successfully";

/// Register time slot tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(update_time_slot_tool())?;
    registry.register_tool(batch_update_time_slots_tool())?;
    registry.register_tool(get_table_time_slots_tool())?;
    Ok(())
}

fn status(slot: &Value) -> &'static str {
    if slot.get("isOpen").and_then(Value::as_bool).unwrap_or(false) {
        "Open"
    } else {
        "Closed"
    }
}

// ============================================================================
// update-time-slot
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTimeSlotParams {
    table_id: i64,
    date: String,
    slot_index: i64,
    is_open: bool,
}

fn update_time_slot_tool() -> RegisteredTool {
    ToolBuilder::new("update-time-slot")
        .description(
            "Opens or closes a single 30-minute time slot (0-47) of a table on a date",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "tableId": id_schema("ID of the table"),
                "date": date_schema(),
                "slotIndex": slot_index_schema(),
                "isOpen": { "type": "boolean", "description": "Whether the slot can be booked" }
            },
            "required": ["tableId", "date", "slotIndex", "isOpen"]
        }))
        .build(update_time_slot)
}

async fn update_time_slot(call: AuthorizedCall, params: UpdateTimeSlotParams) -> ToolResult {
    call.info(format!(
        "Updating time slot {} ({}) for table ID {} on {}...",
        params.slot_index,
        slot_time(params.slot_index),
        params.table_id,
        params.date
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::TIMESLOT_UPDATE_ONE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("update time slot"))?;

    let slot = body
        .field("slot")
        .filter(|s| s.is_object() && body.message() == Some(SLOT_UPDATED))
        .ok_or_else(|| {
            ToolError::DomainFailure(format!(
                "Time slot update response: {}",
                body.message().unwrap_or("Unknown status")
            ))
        })?;

    let time = slot
        .get("slotIndex")
        .and_then(Value::as_i64)
        .map(slot_time)
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ToolsCallResult::text(format!(
        "Time slot updated successfully!\n\nTime Slot Details:\n\
         - Table ID: {}\n- Date: {}\n- Time: {}\n- Status: {}",
        field(slot, "tableId"),
        date_field(slot, "date"),
        time,
        status(slot)
    )))
}

// ============================================================================
// batch-update-time-slots
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateParams {
    table_ids: Vec<i64>,
    dates: Vec<String>,
    slot_indices: Vec<i64>,
    is_open: bool,
    restaurant_id: i64,
}

fn batch_update_time_slots_tool() -> RegisteredTool {
    ToolBuilder::new("batch-update-time-slots")
        .description(
            "Opens or closes many time slots at once, for every combination of the given \
             tables, dates and slot indices",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "tableIds": {
                    "type": "array",
                    "items": id_schema("ID of a table"),
                    "minItems": 1
                },
                "dates": {
                    "type": "array",
                    "items": date_schema(),
                    "minItems": 1
                },
                "slotIndices": {
                    "type": "array",
                    "items": slot_index_schema(),
                    "minItems": 1
                },
                "isOpen": { "type": "boolean", "description": "Whether the slots can be booked" },
                "restaurantId": id_schema("ID of the restaurant owning the tables")
            },
            "required": ["tableIds", "dates", "slotIndices", "isOpen", "restaurantId"]
        }))
        .build(batch_update_time_slots)
}

async fn batch_update_time_slots(call: AuthorizedCall, params: BatchUpdateParams) -> ToolResult {
    call.info(format!(
        "Batch updating time slots for restaurant ID {}...",
        params.restaurant_id
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::TIMESLOT_BATCH_UPDATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("batch update time slots"))?;

    let stats = body
        .field("stats")
        .filter(|s| s.is_object() && body.message() == Some(BATCH_UPDATED))
        .ok_or_else(|| {
            ToolError::DomainFailure(format!(
                "Batch time slot update response: {}",
                body.message().unwrap_or("Unknown status")
            ))
        })?;

    Ok(ToolsCallResult::text(format!(
        "Batch time slot update successful!\n\nUpdate Statistics:\n\
         - Tables processed: {}\n- Dates processed: {}\n\
         - Slot indices processed: {}\n- Total slots updated: {}",
        field(stats, "tablesProcessed"),
        field(stats, "datesProcessed"),
        field(stats, "slotsProcessed"),
        field(stats, "totalSlotsUpdated")
    )))
}

// ============================================================================
// get-table-time-slots
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDateParams {
    table_id: i64,
    date: String,
}

fn get_table_time_slots_tool() -> RegisteredTool {
    ToolBuilder::new("get-table-time-slots")
        .description("Fetches every time slot of a table on a date and whether it is open")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "tableId": id_schema("ID of the table"),
                "date": date_schema()
            },
            "required": ["tableId", "date"]
        }))
        .build(get_table_time_slots)
}

async fn get_table_time_slots(call: AuthorizedCall, params: TableDateParams) -> ToolResult {
    call.info(format!(
        "Fetching time slots for table ID {} on {}...",
        params.table_id, params.date
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::table_time_slots(params.table_id, &params.date)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch time slots"))?;

    let retrieved = body.message() == Some(SLOTS_RETRIEVED)
        && body.field("timeSlots").is_some_and(Value::is_array);
    if !retrieved {
        return Err(ToolError::DomainFailure(format!(
            "Failed to retrieve time slots: {}",
            body.message().unwrap_or("Unknown error")
        )));
    }

    let day = long_date(&params.date);
    let slots = items(body.field("timeSlots"));
    if slots.is_empty() {
        return Ok(ToolsCallResult::text(format!(
            "No time slots found for table ID {} on {}.",
            params.table_id, day
        )));
    }

    let listing = slots
        .iter()
        .filter_map(|slot| {
            let index = slot.get("slotIndex").and_then(Value::as_i64)?;
            Some(format!("- {}: {}", slot_time(index), status(slot)))
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ToolsCallResult::text(format!(
        "Time Slots for Table ID {} on {}:\n\n{}",
        params.table_id, day, listing
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::testing::{authorized_call, bound_context, spawn_backend};
    use axum::{
        extract::Path,
        routing::{get, post},
        Json, Router,
    };

    #[tokio::test]
    async fn test_update_time_slot_success() {
        let base = spawn_backend(Router::new().route(
            "/timeslot/update-one",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "message": SLOT_UPDATED, "slot": body }))
            }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let result = update_time_slot(
            call,
            UpdateTimeSlotParams {
                table_id: 5,
                date: "2025-06-02".to_string(),
                slot_index: 36,
                is_open: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            result.joined_text(),
            "Time slot updated successfully!\n\nTime Slot Details:\n\
             - Table ID: 5\n- Date: Monday, June 2, 2025\n- Time: 6:00pm\n- Status: Closed"
        );
    }

    #[tokio::test]
    async fn test_update_time_slot_domain_failure() {
        let base = spawn_backend(Router::new().route(
            "/timeslot/update-one",
            post(|| async { Json(json!({ "message": "Slot is booked" })) }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let err = update_time_slot(
            call,
            UpdateTimeSlotParams {
                table_id: 5,
                date: "2025-06-02".to_string(),
                slot_index: 36,
                is_open: false,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Time slot update response: Slot is booked");
    }

    #[tokio::test]
    async fn test_batch_update_reports_stats() {
        let base = spawn_backend(Router::new().route(
            "/timeslot/batch-update",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["tableIds"], json!([1, 2]));
                Json(json!({
                    "message": BATCH_UPDATED,
                    "stats": {
                        "tablesProcessed": 2,
                        "datesProcessed": 1,
                        "slotsProcessed": 4,
                        "totalSlotsUpdated": 8
                    }
                }))
            }),
        ))
        .await;
        let (call, _rx) = authorized_call(&base);

        let result = batch_update_time_slots(
            call,
            BatchUpdateParams {
                table_ids: vec![1, 2],
                dates: vec!["2025-06-02".to_string()],
                slot_indices: vec![24, 25, 26, 27],
                is_open: true,
                restaurant_id: 3,
            },
        )
        .await
        .unwrap();

        let text = result.joined_text();
        assert!(text.starts_with("Batch time slot update successful!"));
        assert!(text.ends_with("- Total slots updated: 8"));
    }

    #[tokio::test]
    async fn test_batch_update_requires_tables() {
        let mut registry = McpRegistry::new();
        register_tools(&mut registry).unwrap();

        let (ctx, _rx) = bound_context("http://localhost:9");
        let result = registry
            .call_tool(
                "batch-update-time-slots",
                ctx,
                json!({
                    "tableIds": [],
                    "dates": ["2025-06-02"],
                    "slotIndices": [24],
                    "isOpen": true,
                    "restaurantId": 3
                }),
            )
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.joined_text().contains("tableIds: "));
    }

    #[tokio::test]
    async fn test_get_table_time_slots() {
        let base = spawn_backend(Router::new().route(
            "/timeslot/table/{table}/date/{date}",
            get(|Path((table, date)): Path<(i64, String)>| async move {
                match table {
                    5 => Json(json!({
                        "message": SLOTS_RETRIEVED,
                        "timeSlots": [
                            { "slotIndex": 24, "isOpen": true, "date": date },
                            { "slotIndex": 25, "isOpen": false }
                        ]
                    })),
                    6 => Json(json!({ "message": SLOTS_RETRIEVED, "timeSlots": [] })),
                    _ => Json(json!({ "message": "Table not found" })),
                }
            }),
        ))
        .await;
        let params = |table_id| TableDateParams {
            table_id,
            date: "2025-06-02".to_string(),
        };

        let (call, _rx) = authorized_call(&base);
        let text = get_table_time_slots(call, params(5))
            .await
            .unwrap()
            .joined_text();
        assert_eq!(
            text,
            "Time Slots for Table ID 5 on Monday, June 2, 2025:\n\n\
             - 12:00pm: Open\n- 12:30pm: Closed"
        );

        let (call, _rx) = authorized_call(&base);
        let empty = get_table_time_slots(call, params(6)).await.unwrap();
        assert_eq!(
            empty.joined_text(),
            "No time slots found for table ID 6 on Monday, June 2, 2025."
        );

        let (call, _rx) = authorized_call(&base);
        let missing = get_table_time_slots(call, params(7)).await.unwrap_err();
        assert_eq!(
            missing.to_string(),
            "Failed to retrieve time slots: Table not found"
        );
    }
}
