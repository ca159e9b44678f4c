//! Booking Tools
//!
//! Table bookings are made for a date and a set of half-hour slots
//! (0 is 12:00am, 47 is 11:30pm). Breakfast is usually slots 16-19, lunch
//! 24-27 and dinner 36-41.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::format::{date_field, field, items, long_date, slot_time, slots_list};
use super::{date_schema, id_schema, slot_index_schema};
use crate::backend::endpoints;
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const BOOKING_SUCCESSFUL: &str = "Booking successful";

/// At most this many bookings are listed by `get-all-bookings`.
const BOOKINGS_DISPLAY_LIMIT: usize = 10;

/// Register booking tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_booking_tool())?;
    registry.register_tool(get_available_slots_tool())?;
    registry.register_tool(get_timeslots_tool())?;
    registry.register_tool(get_all_bookings_tool())?;
    registry.register_tool(get_bookings_by_date_tool())?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantDateParams {
    restaurant_id: i64,
    date: String,
}

fn restaurant_date_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "restaurantId": id_schema("ID of the restaurant"),
            "date": date_schema()
        },
        "required": ["restaurantId", "date"]
    })
}

// ============================================================================
// create-booking
// ============================================================================

/// Forwarded to the backend as-is.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingParams {
    table_id: i64,
    restaurant_id: i64,
    date: String,
    slot_indices: Vec<i64>,
    customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_phone: Option<String>,
}

fn create_booking_tool() -> RegisteredTool {
    ToolBuilder::new("create-booking")
        .description(
            "Creates a new table booking for a date and a set of 30-minute time slots \
             (0-47, e.g. [36, 37, 38] for 6pm-7:30pm)",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "tableId": id_schema("ID of the table to book"),
                "restaurantId": id_schema("ID of the restaurant"),
                "date": date_schema(),
                "slotIndices": {
                    "type": "array",
                    "items": slot_index_schema(),
                    "minItems": 1,
                    "uniqueItems": true,
                    "description": "Time slot indices to book"
                },
                "customerName": { "type": "string", "minLength": 1, "description": "Name of the customer" },
                "customerPhone": { "type": "string", "description": "Phone number of the customer" }
            },
            "required": ["tableId", "restaurantId", "date", "slotIndices", "customerName"]
        }))
        .build(create_booking)
}

async fn create_booking(call: AuthorizedCall, params: CreateBookingParams) -> ToolResult {
    call.info(format!(
        "Creating booking for table ID {} on {} for slots {}...",
        params.table_id,
        params.date,
        slots_list(Some(&json!(params.slot_indices)))
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::BOOKINGS_BOOK), &call.token, &payload)
        .await
        .map_err(ToolError::backend("create booking"))?;

    let booking = body
        .field("booking")
        .filter(|b| b.is_object() && body.message() == Some(BOOKING_SUCCESSFUL))
        .ok_or_else(|| {
            ToolError::DomainFailure(format!(
                "Booking creation response: {}",
                body.message().unwrap_or("Unknown status")
            ))
        })?;

    Ok(ToolsCallResult::text(format!(
        "Booking created successfully!\n\nBooking Details:\n\
         - Booking ID: {}\n- Customer: {}\n- Date: {}\n- Time: {}\n- Table ID: {}",
        field(booking, "id"),
        field(booking, "customerName"),
        date_field(booking, "date"),
        slots_list(booking.get("slotIndices")),
        field(booking, "tableId")
    )))
}

// ============================================================================
// get-available-slots
// ============================================================================

fn get_available_slots_tool() -> RegisteredTool {
    ToolBuilder::new("get-available-slots")
        .description("Fetches the tables of a restaurant and their free booking slots on a date")
        .input_schema(restaurant_date_schema())
        .build(get_available_slots)
}

async fn get_available_slots(call: AuthorizedCall, params: RestaurantDateParams) -> ToolResult {
    call.info(format!(
        "Fetching available slots for restaurant ID {} on {}...",
        params.restaurant_id, params.date
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::available_slots(params.restaurant_id, &params.date)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch available slots"))?;

    let tables = items(body.field("tables"));
    if tables.is_empty() {
        return Ok(ToolsCallResult::text(
            "No tables or available slots found for this restaurant on the specified date.",
        ));
    }

    let listing = tables
        .iter()
        .map(|table| {
            let slots = if items(table.get("availableSlots")).is_empty() {
                "None available".to_string()
            } else {
                slots_list(table.get("availableSlots"))
            };
            format!(
                "- {} (ID: {})\n  Capacity: {} people\n  Available Time Slots: {}",
                field(table, "tableName"),
                field(table, "tableId"),
                field(table, "capacity"),
                slots
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Available Booking Slots for {}:\n\n{}",
        long_date(&params.date),
        listing
    )))
}

// ============================================================================
// get-timeslots
// ============================================================================

fn get_timeslots_tool() -> RegisteredTool {
    ToolBuilder::new("get-timeslots")
        .description(
            "Fetches every time slot of each table on a date, with open/booked status \
             and the customer of each booking",
        )
        .input_schema(restaurant_date_schema())
        .build(get_timeslots)
}

fn table_slot_summary(table: &Value) -> String {
    let slots = items(table.get("timeSlots"));
    let is_open = |slot: &Value| slot.get("isOpen").and_then(Value::as_bool).unwrap_or(false);

    let open = slots.iter().filter(|&s| is_open(s)).count();
    let booked = slots.len() - open;
    let bookings = slots
        .iter()
        .filter(|&s| !is_open(s))
        .filter_map(|s| {
            let booking = s.get("booking").filter(|b| b.is_object())?;
            let index = s.get("slotIndex").and_then(Value::as_i64)?;
            Some(format!("{} - {}", slot_time(index), field(booking, "customerName")))
        })
        .collect::<Vec<_>>();

    format!(
        "- {} (ID: {})\n  Capacity: {} people\n  Open Slots: {}\n  Booked Slots: {}\n  Bookings: {}",
        field(table, "tableName"),
        field(table, "tableId"),
        field(table, "capacity"),
        open,
        booked,
        if bookings.is_empty() {
            "None".to_string()
        } else {
            bookings.join(", ")
        }
    )
}

async fn get_timeslots(call: AuthorizedCall, params: RestaurantDateParams) -> ToolResult {
    call.info(format!(
        "Fetching time slots for restaurant ID {} on {}...",
        params.restaurant_id, params.date
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::booking_timeslots(params.restaurant_id, &params.date)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch time slots"))?;

    let tables = items(body.field("tables"));
    if tables.is_empty() {
        return Ok(ToolsCallResult::text(
            "No tables found for this restaurant on the specified date.",
        ));
    }

    let listing = tables
        .iter()
        .map(table_slot_summary)
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Time Slots for {}:\n\n{}",
        long_date(&params.date),
        listing
    )))
}

// ============================================================================
// get-all-bookings
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_all_bookings_tool() -> RegisteredTool {
    ToolBuilder::new("get-all-bookings")
        .description("Fetches all bookings of a restaurant, listing the first 10")
        .input_schema(json!({
            "type": "object",
            "properties": { "restaurantId": id_schema("ID of the restaurant") },
            "required": ["restaurantId"]
        }))
        .build(get_all_bookings)
}

async fn get_all_bookings(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info(format!(
        "Fetching all bookings for restaurant ID {}...",
        params.restaurant_id
    ))
    .await;

    let body = call
        .backend()
        .get(&call.url(&endpoints::booked(params.restaurant_id)), &call.token)
        .await
        .map_err(ToolError::backend("fetch bookings"))?;

    let bookings = items(body.field("bookings"));
    if bookings.is_empty() {
        return Ok(ToolsCallResult::text("No bookings found for this restaurant."));
    }

    let total = body
        .field("totalBookings")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(bookings.len());

    let listing = bookings
        .iter()
        .take(BOOKINGS_DISPLAY_LIMIT)
        .map(|booking| {
            format!(
                "- {} | {}\n  Customer: {}\n  Table: {} (Capacity: {})\n  Booking ID: {}",
                field(booking, "date"),
                slots_list(booking.get("slotIndices")),
                field(booking, "customerName"),
                field(booking, "tableName"),
                field(booking, "capacity"),
                field(booking, "id")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let remaining = match total.checked_sub(BOOKINGS_DISPLAY_LIMIT) {
        Some(more) if more > 0 => format!("\n\n...and {} more bookings.", more),
        _ => String::new(),
    };

    Ok(ToolsCallResult::text(format!(
        "All Bookings ({} total):\n\n{}{}",
        total, listing, remaining
    )))
}

// ============================================================================
// get-bookings-by-date
// ============================================================================

fn get_bookings_by_date_tool() -> RegisteredTool {
    ToolBuilder::new("get-bookings-by-date")
        .description("Fetches the bookings of a restaurant on a specific date")
        .input_schema(restaurant_date_schema())
        .build(get_bookings_by_date)
}

async fn get_bookings_by_date(call: AuthorizedCall, params: RestaurantDateParams) -> ToolResult {
    call.info(format!(
        "Fetching bookings for restaurant ID {} on {}...",
        params.restaurant_id, params.date
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::bookings_by_date(params.restaurant_id, &params.date)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch bookings"))?;

    let day = long_date(&params.date);
    let bookings = items(body.field("bookings"));
    if bookings.is_empty() {
        return Ok(ToolsCallResult::text(format!("No bookings found for {}.", day)));
    }

    let listing = bookings
        .iter()
        .map(|booking| {
            let phone = booking
                .get("customerPhone")
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty())
                .map(|p| format!(" ({})", p))
                .unwrap_or_default();
            let table = booking.get("table").cloned().unwrap_or(Value::Null);
            format!(
                "- {}\n  Customer: {}{}\n  Table: {} (Capacity: {})\n  Booking ID: {}",
                slots_list(booking.get("slotIndices")),
                field(booking, "customerName"),
                phone,
                field(&table, "name"),
                field(&table, "capacity"),
                field(booking, "id")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Bookings for {} ({} total):\n\n{}",
        day,
        bookings.len(),
        listing
    )))
}
