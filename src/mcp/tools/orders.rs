//! Order Tools
//!
//! Orders belong to a booking and carry dish items whose kitchen status is
//! tracked individually. Every order endpoint reports `success: true` when
//! it went through.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::format::{date_field, field, items, money};
use super::id_schema;
use crate::backend::{endpoints, BackendBody};
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Orders listed by `get-all-orders` before the remainder is summarized.
const ORDERS_DISPLAY_LIMIT: usize = 10;

const ITEM_STATUSES: [&str; 5] = ["pending", "preparing", "ready", "served", "cancelled"];

/// Register order tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(get_all_orders_tool())?;
    registry.register_tool(get_order_by_id_tool())?;
    registry.register_tool(get_orders_by_booking_tool())?;
    registry.register_tool(create_order_tool())?;
    registry.register_tool(get_booking_total_tool())?;
    registry.register_tool(update_order_item_status_tool())?;
    Ok(())
}

fn ensure_success(body: &BackendBody, action: &str) -> Result<(), ToolError> {
    if body.field("success").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(ToolError::DomainFailure(format!(
            "Failed to {}: {}",
            action,
            body.message().unwrap_or("Unknown error")
        )))
    }
}

fn dish_name(item: &Value) -> String {
    item.get("dish")
        .map(|dish| field(dish, "name"))
        .unwrap_or_else(|| "unknown".to_string())
}

/// One order as a list entry with its items inline.
fn order_summary(order: &Value) -> String {
    let order_items = items(order.get("items"))
        .iter()
        .map(|item| {
            format!(
                "{}x {} ({})",
                field(item, "quantity"),
                dish_name(item),
                field(item, "status")
            )
        })
        .collect::<Vec<_>>();
    let order_items = if order_items.is_empty() {
        "None".to_string()
    } else {
        order_items.join(", ")
    };

    format!(
        "- Order #{} (ID: {})\n  Status: {}\n  Total: {}\n  Items: {}",
        field(order, "orderNumber"),
        field(order, "id"),
        field(order, "status"),
        money(order.get("totalAmount")),
        order_items
    )
}

fn customer_name(booking: Option<&Value>) -> String {
    booking
        .map(|b| field(b, "customerName"))
        .unwrap_or_else(|| "unknown".to_string())
}

fn booking_date(booking: Option<&Value>) -> String {
    booking
        .map(|b| date_field(b, "date"))
        .unwrap_or_else(|| "Unknown date".to_string())
}

// ============================================================================
// get-all-orders
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_all_orders_tool() -> RegisteredTool {
    ToolBuilder::new("get-all-orders")
        .description("Fetches all orders of a restaurant, listing the first 10")
        .input_schema(json!({
            "type": "object",
            "properties": { "restaurantId": id_schema("ID of the restaurant") },
            "required": ["restaurantId"]
        }))
        .build(get_all_orders)
}

async fn get_all_orders(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info(format!(
        "Fetching all orders for restaurant ID {}...",
        params.restaurant_id
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::orders_of_restaurant(params.restaurant_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch orders"))?;
    ensure_success(&body, "fetch orders")?;

    let orders = items(body.field("orders"));
    if orders.is_empty() {
        return Ok(ToolsCallResult::text("No orders found for this restaurant."));
    }

    let listing = orders
        .iter()
        .take(ORDERS_DISPLAY_LIMIT)
        .map(order_summary)
        .collect::<Vec<_>>()
        .join("\n\n");

    let remaining = match orders.len().checked_sub(ORDERS_DISPLAY_LIMIT) {
        Some(more) if more > 0 => format!("\n\n...and {} more orders.", more),
        _ => String::new(),
    };

    Ok(ToolsCallResult::text(format!(
        "All Orders for Restaurant ID {} ({} total):\n\n{}{}",
        params.restaurant_id,
        orders.len(),
        listing,
        remaining
    )))
}

// ============================================================================
// get-order-by-id
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderParams {
    order_id: i64,
}

fn get_order_by_id_tool() -> RegisteredTool {
    ToolBuilder::new("get-order-by-id")
        .description("Fetches one order with its table and items")
        .input_schema(json!({
            "type": "object",
            "properties": { "orderId": id_schema("ID of the order") },
            "required": ["orderId"]
        }))
        .build(get_order_by_id)
}

fn order_details(order: &Value) -> String {
    let table = order.get("table").filter(|t| !t.is_null());
    let table_name = table
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let capacity = table
        .and_then(|t| t.get("capacity"))
        .filter(|c| !c.is_null())
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let notes = order
        .get("notes")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or("None");

    let order_items = items(order.get("items"))
        .iter()
        .map(|item| {
            let description = item
                .get("dish")
                .and_then(|d| d.get("description"))
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .unwrap_or("N/A");
            format!(
                "- {}x {} ({} each)\n    Status: {}\n    Description: {}",
                field(item, "quantity"),
                dish_name(item),
                money(item.get("unitPrice")),
                field(item, "status"),
                description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Order Details for #{} (ID: {})\n\nStatus: {}\nTable: {} (Capacity: {})\n\
         Total Amount: {}\nNotes: {}\n\nItems:\n{}",
        field(order, "orderNumber"),
        field(order, "id"),
        field(order, "status"),
        table_name,
        capacity,
        money(order.get("totalAmount")),
        notes,
        order_items
    )
}

async fn get_order_by_id(call: AuthorizedCall, params: OrderParams) -> ToolResult {
    call.info(format!(
        "Fetching order details for order ID {}...",
        params.order_id
    ))
    .await;

    let body = call
        .backend()
        .get(&call.url(&endpoints::order(params.order_id)), &call.token)
        .await
        .map_err(ToolError::backend("fetch order"))?;
    ensure_success(&body, "fetch order")?;

    match body.field("order").filter(|o| o.is_object()) {
        Some(order) => Ok(ToolsCallResult::text(order_details(order))),
        None => Ok(ToolsCallResult::text("Order not found.")),
    }
}

// ============================================================================
// get-orders-by-booking
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingParams {
    booking_id: i64,
}

fn booking_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "bookingId": id_schema("ID of the booking") },
        "required": ["bookingId"]
    })
}

fn get_orders_by_booking_tool() -> RegisteredTool {
    ToolBuilder::new("get-orders-by-booking")
        .description("Fetches all orders placed for a booking")
        .input_schema(booking_schema())
        .build(get_orders_by_booking)
}

async fn get_orders_by_booking(call: AuthorizedCall, params: BookingParams) -> ToolResult {
    call.info(format!(
        "Fetching orders for booking ID {}...",
        params.booking_id
    ))
    .await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::booking_orders(params.booking_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch booking orders"))?;
    ensure_success(&body, "fetch booking orders")?;

    let orders = items(body.field("orders"));
    if orders.is_empty() {
        return Ok(ToolsCallResult::text(format!(
            "No orders found for booking ID {}.",
            params.booking_id
        )));
    }

    let booking = body.field("booking");
    let listing = orders
        .iter()
        .map(order_summary)
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Orders for Booking ID {}\n\nCustomer: {}\nDate: {}\nTotal Orders: {}\n\
         Grand Total: {}\n\nOrders:\n{}",
        params.booking_id,
        customer_name(booking),
        booking_date(booking),
        body.field("orderCount")
            .map(|c| c.to_string())
            .unwrap_or_else(|| orders.len().to_string()),
        money(body.field("grandTotal")),
        listing
    )))
}

// ============================================================================
// create-order
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItem {
    dish_id: i64,
    quantity: i64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderParams {
    restaurant_id: i64,
    table_id: i64,
    booking_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    items: Vec<OrderItem>,
}

fn create_order_tool() -> RegisteredTool {
    ToolBuilder::new("create-order")
        .description("Creates a new order with dishes and quantities for a booking")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "restaurantId": id_schema("ID of the restaurant"),
                "tableId": id_schema("ID of the table for the order"),
                "bookingId": id_schema("ID of the booking this order is for"),
                "notes": { "type": "string", "description": "Optional notes for the order" },
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "dishId": id_schema("ID of the dish to order"),
                            "quantity": { "type": "integer", "minimum": 1 }
                        },
                        "required": ["dishId", "quantity"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["restaurantId", "tableId", "bookingId", "items"]
        }))
        .build(create_order)
}

async fn create_order(call: AuthorizedCall, params: CreateOrderParams) -> ToolResult {
    call.info(format!(
        "Creating order for booking ID {} with {} items...",
        params.booking_id,
        params.items.len()
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::ORDERS_CREATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("create order"))?;
    ensure_success(&body, "create order")?;

    let order = body
        .field("data")
        .ok_or_else(|| ToolError::DomainFailure("Failed to create order: no order returned".into()))?;

    Ok(ToolsCallResult::text(format!(
        "Order created successfully!\n\nOrder Details:\n- Order #{} (ID: {})\n\
         - Table ID: {}\n- Status: {}\n- Total Amount: {}\n- Number of Items: {}",
        field(order, "orderNumber"),
        field(order, "id"),
        field(order, "tableId"),
        field(order, "status"),
        money(order.get("totalAmount")),
        items(order.get("items")).len()
    )))
}

// ============================================================================
// get-booking-total
// ============================================================================

fn get_booking_total_tool() -> RegisteredTool {
    ToolBuilder::new("get-booking-total")
        .description("Calculates the grand total of all orders for a booking")
        .input_schema(booking_schema())
        .build(get_booking_total)
}

async fn get_booking_total(call: AuthorizedCall, params: BookingParams) -> ToolResult {
    call.info(format!(
        "Calculating total for booking ID {}...",
        params.booking_id
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(
            &call.url(endpoints::ORDERS_BOOKING_TOTAL),
            &call.token,
            &payload,
        )
        .await
        .map_err(ToolError::backend("calculate booking total"))?;
    ensure_success(&body, "calculate booking total")?;

    let data = body.field("data");
    let orders = items(data.and_then(|d| d.get("orders")));
    let Some(data) = data.filter(|_| !orders.is_empty()) else {
        return Ok(ToolsCallResult::text(format!(
            "No orders found for booking ID {}.",
            params.booking_id
        )));
    };

    let booking = data.get("booking");
    Ok(ToolsCallResult::text(format!(
        "Booking Total for ID {}\n\nCustomer: {}\nDate: {}\nOrder Count: {}\nGrand Total: {}",
        params.booking_id,
        customer_name(booking),
        booking_date(booking),
        data.get("orderCount")
            .map(|c| c.to_string())
            .unwrap_or_else(|| orders.len().to_string()),
        money(data.get("grandTotal"))
    )))
}

// ============================================================================
// update-order-item-status
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItemStatusParams {
    order_item_ids: Vec<i64>,
    status: String,
    restaurant_id: i64,
}

fn update_order_item_status_tool() -> RegisteredTool {
    ToolBuilder::new("update-order-item-status")
        .description(
            "Updates the status of order items. \
             Valid statuses: pending, preparing, ready, served, cancelled",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "orderItemIds": {
                    "type": "array",
                    "minItems": 1,
                    "items": id_schema("ID of an order item")
                },
                "status": { "type": "string", "enum": ITEM_STATUSES },
                "restaurantId": id_schema("ID of the restaurant these items belong to")
            },
            "required": ["orderItemIds", "status", "restaurantId"]
        }))
        .build(update_order_item_status)
}

async fn update_order_item_status(
    call: AuthorizedCall,
    params: UpdateItemStatusParams,
) -> ToolResult {
    call.info(format!(
        "Updating {} items to status '{}'...",
        params.order_item_ids.len(),
        params.status
    ))
    .await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(
            &call.url(endpoints::ORDERS_UPDATE_ITEM_STATUS),
            &call.token,
            &payload,
        )
        .await
        .map_err(ToolError::backend("update item status"))?;
    ensure_success(&body, "update item status")?;

    let headline = body.message().map(str::to_string).unwrap_or_else(|| {
        format!(
            "Successfully updated {} items to status '{}'",
            params.order_item_ids.len(),
            params.status
        )
    });
    let data = body.field("data");
    let count = |key: &str| items(data.and_then(|d| d.get(key))).len();

    Ok(ToolsCallResult::text(format!(
        "{}\n\nItems updated: {}\nAffected orders: {}",
        headline,
        count("updatedItems"),
        count("affectedOrders")
    )))
}
