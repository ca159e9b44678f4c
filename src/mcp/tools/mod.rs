//! MCP Tools
//!
//! Restaurant operations exposed to the agent, plus a diagnostics tool for
//! exercising notifications.

pub mod bookings;
pub mod diagnostics;
pub mod format;
pub mod menus;
pub mod orders;
pub mod restaurants;
pub mod roles;
pub mod staff;
pub mod tables;
pub mod time_slots;
pub mod users;

use serde::Deserialize;

use super::error::RegistryError;
use super::registry::McpRegistry;

/// Arguments of tools that take none.
#[derive(Debug, Deserialize)]
pub struct NoArguments {}

/// Input schema of tools that take no arguments.
pub(crate) fn empty_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

/// A positive integer id.
pub(crate) fn id_schema(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "integer", "minimum": 1, "description": description })
}

/// A calendar day, `YYYY-MM-DD`.
pub(crate) fn date_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
        "description": "Date in YYYY-MM-DD format"
    })
}

/// Index of a half-hour slot in the day, 0 (12:00am) to 47 (11:30pm).
pub(crate) fn slot_index_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "maximum": format::SLOTS_PER_DAY - 1
    })
}

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    users::register_tools(registry)?;
    restaurants::register_tools(registry)?;
    tables::register_tools(registry)?;
    staff::register_tools(registry)?;
    roles::register_tools(registry)?;
    bookings::register_tools(registry)?;
    time_slots::register_tools(registry)?;
    menus::register_tools(registry)?;
    orders::register_tools(registry)?;
    diagnostics::register_tools(registry)?;
    Ok(())
}
