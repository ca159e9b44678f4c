//! MCP Resources
//!
//! Read-only views of backend data addressed by `restaurant://` URIs.

pub mod restaurant;

use super::error::RegistryError;
use super::registry::McpRegistry;

/// Register all resources with the registry
pub fn register_all_resources(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    restaurant::register_resources(registry)
}
