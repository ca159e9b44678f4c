//! Menu Tools
//!
//! Menus group the dishes a restaurant serves.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::format::{field, items, money, yes_no};
use super::id_schema;
use crate::backend::{endpoints, BackendBody};
use crate::mcp::context::AuthorizedCall;
use crate::mcp::error::{RegistryError, ToolError};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const MENU_CREATED: &str = "Menu created successfully";
const MENU_UPDATED: &str = "Menu updated successfully";
const DISH_CREATED: &str = "Dish created successfully";
const DISH_UPDATED: &str = "Dish updated successfully";

/// Register menu tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(create_menu_tool())?;
    registry.register_tool(update_menu_tool())?;
    registry.register_tool(create_dish_tool())?;
    registry.register_tool(update_dish_tool())?;
    registry.register_tool(get_restaurant_menus_tool())?;
    registry.register_tool(get_menu_dishes_tool())?;
    Ok(())
}

/// Fail with `Failed to <action>: <message>` unless the backend confirmed
/// with `expected`.
fn confirm(body: &BackendBody, expected: &str, action: &str) -> Result<(), ToolError> {
    if body.message() == Some(expected) {
        Ok(())
    } else {
        Err(ToolError::DomainFailure(format!(
            "Failed to {}: {}",
            action,
            body.message().unwrap_or("Unknown error")
        )))
    }
}

/// Id of the created entity, reported under `data`.
fn created_id(body: &BackendBody) -> String {
    body.field("data")
        .map(|data| field(data, "id"))
        .unwrap_or_else(|| "unknown".to_string())
}

fn text_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn name_schema(description: &str) -> Value {
    json!({ "type": "string", "minLength": 1, "description": description })
}

// ============================================================================
// create-menu / update-menu
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct MenuParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    menu_id: Option<i64>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    restaurant_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

fn menu_schema(with_id: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "name": name_schema("Menu name"),
            "description": text_schema("Menu description"),
            "restaurantId": id_schema("ID of the restaurant"),
            "imageUrl": text_schema("Image URL of the menu")
        },
        "required": ["name", "restaurantId"]
    });
    if with_id {
        schema["properties"]["menuId"] = id_schema("ID of the menu");
        schema["required"] = json!(["menuId", "name", "restaurantId"]);
    }
    schema
}

fn create_menu_tool() -> RegisteredTool {
    ToolBuilder::new("create-menu")
        .description("Creates a new menu for a restaurant")
        .input_schema(menu_schema(false))
        .build(create_menu)
}

async fn create_menu(call: AuthorizedCall, params: MenuParams) -> ToolResult {
    call.info("Creating new menu...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::MENU_CREATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("create menu"))?;
    confirm(&body, MENU_CREATED, "create menu")?;

    Ok(ToolsCallResult::text(format!(
        "Successfully created menu \"{}\" with ID: {}",
        params.name,
        created_id(&body)
    )))
}

fn update_menu_tool() -> RegisteredTool {
    ToolBuilder::new("update-menu")
        .description("Updates an existing menu")
        .input_schema(menu_schema(true))
        .build(update_menu)
}

async fn update_menu(call: AuthorizedCall, params: MenuParams) -> ToolResult {
    call.info("Updating menu...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::MENU_UPDATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("update menu"))?;
    confirm(&body, MENU_UPDATED, "update menu")?;

    Ok(ToolsCallResult::text(format!(
        "Successfully updated menu \"{}\" (ID: {})",
        params.name,
        params.menu_id.unwrap_or_default()
    )))
}

// ============================================================================
// create-dish / update-dish
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct DishParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dish_id: Option<i64>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calories: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_vegetarian: Option<bool>,
    menu_id: i64,
    restaurant_id: i64,
}

fn dish_schema(with_id: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "name": name_schema("Dish name"),
            "description": text_schema("Dish description"),
            "price": { "type": "number", "minimum": 0, "description": "Price in dollars" },
            "imageUrl": text_schema("Image URL of the dish"),
            "isAvailable": { "type": "boolean", "description": "Whether the dish can be ordered" },
            "calories": { "type": "integer", "minimum": 0 },
            "isVegetarian": { "type": "boolean" },
            "menuId": id_schema("ID of the menu"),
            "restaurantId": id_schema("ID of the restaurant")
        },
        "required": ["name", "price", "menuId", "restaurantId"]
    });
    if with_id {
        schema["properties"]["dishId"] = id_schema("ID of the dish");
        schema["required"] = json!([
            "dishId",
            "name",
            "price",
            "isAvailable",
            "isVegetarian",
            "menuId",
            "restaurantId"
        ]);
    }
    schema
}

fn create_dish_tool() -> RegisteredTool {
    ToolBuilder::new("create-dish")
        .description("Creates a new dish in a menu")
        .input_schema(dish_schema(false))
        .build(create_dish)
}

async fn create_dish(call: AuthorizedCall, params: DishParams) -> ToolResult {
    call.info("Creating new dish...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::DISH_CREATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("create dish"))?;
    confirm(&body, DISH_CREATED, "create dish")?;

    Ok(ToolsCallResult::text(format!(
        "Successfully created dish \"{}\" with ID: {}",
        params.name,
        created_id(&body)
    )))
}

fn update_dish_tool() -> RegisteredTool {
    ToolBuilder::new("update-dish")
        .description("Updates an existing dish")
        .input_schema(dish_schema(true))
        .build(update_dish)
}

async fn update_dish(call: AuthorizedCall, params: DishParams) -> ToolResult {
    call.info("Updating dish...").await;

    let payload = serde_json::to_value(&params)?;
    let body = call
        .backend()
        .post(&call.url(endpoints::DISH_UPDATE), &call.token, &payload)
        .await
        .map_err(ToolError::backend("update dish"))?;
    confirm(&body, DISH_UPDATED, "update dish")?;

    Ok(ToolsCallResult::text(format!(
        "Successfully updated dish \"{}\" (ID: {})",
        params.name,
        params.dish_id.unwrap_or_default()
    )))
}

// ============================================================================
// get-restaurant-menus
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantParams {
    restaurant_id: i64,
}

fn get_restaurant_menus_tool() -> RegisteredTool {
    ToolBuilder::new("get-restaurant-menus")
        .description("Fetches all menus for a restaurant")
        .input_schema(json!({
            "type": "object",
            "properties": { "restaurantId": id_schema("ID of the restaurant") },
            "required": ["restaurantId"]
        }))
        .build(get_restaurant_menus)
}

fn description_of(value: &Value) -> &str {
    value
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .unwrap_or("No description provided")
}

async fn get_restaurant_menus(call: AuthorizedCall, params: RestaurantParams) -> ToolResult {
    call.info("Fetching restaurant menus...").await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::restaurant_menus(params.restaurant_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch restaurant menus"))?;

    let menus = items(body.field("data"));
    if menus.is_empty() {
        return Ok(ToolsCallResult::text("No menus found for this restaurant."));
    }

    let listing = menus
        .iter()
        .map(|menu| {
            format!(
                "- {} (ID: {})\n  {}",
                field(menu, "name"),
                field(menu, "id"),
                description_of(menu)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Restaurant Menus ({} total):\n\n{}",
        menus.len(),
        listing
    )))
}

// ============================================================================
// get-menu-dishes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuDishesParams {
    restaurant_id: i64,
    menu_id: i64,
}

fn get_menu_dishes_tool() -> RegisteredTool {
    ToolBuilder::new("get-menu-dishes")
        .description("Fetches all dishes for a specific menu")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "restaurantId": id_schema("ID of the restaurant"),
                "menuId": id_schema("ID of the menu")
            },
            "required": ["restaurantId", "menuId"]
        }))
        .build(get_menu_dishes)
}

fn dish_summary(dish: &Value) -> String {
    let mut summary = format!(
        "- {} (ID: {})\n  Price: {}\n  {}\n  Available: {}\n  Vegetarian: {}",
        field(dish, "name"),
        field(dish, "id"),
        money(dish.get("price")),
        description_of(dish),
        yes_no(dish, "isAvailable"),
        yes_no(dish, "isVegetarian")
    );
    if let Some(calories) = dish.get("calories").and_then(Value::as_i64).filter(|c| *c > 0) {
        summary.push_str(&format!("\n  Calories: {}", calories));
    }
    summary
}

async fn get_menu_dishes(call: AuthorizedCall, params: MenuDishesParams) -> ToolResult {
    call.info("Fetching menu dishes...").await;

    let body = call
        .backend()
        .get(
            &call.url(&endpoints::menu_dishes(params.restaurant_id, params.menu_id)),
            &call.token,
        )
        .await
        .map_err(ToolError::backend("fetch menu dishes"))?;

    let dishes = items(body.field("data"));
    if dishes.is_empty() {
        return Ok(ToolsCallResult::text("No dishes found for this menu."));
    }

    let listing = dishes
        .iter()
        .map(dish_summary)
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolsCallResult::text(format!(
        "Menu Dishes ({} total):\n\n{}",
        dishes.len(),
        listing
    )))
}
