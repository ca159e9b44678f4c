//! Diagnostics Tools
//!
//! `start-notification-stream` emits a burst of log notifications so
//! clients can check that their notification plumbing works. It touches
//! neither the backend nor the session credential.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::mcp::context::ToolContext;
use crate::mcp::error::RegistryError;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

const DEFAULT_INTERVAL_MS: u64 = 100;
const DEFAULT_COUNT: u64 = 50;
const MAX_COUNT: u64 = 100;
const MAX_INTERVAL_MS: u64 = 10_000;

/// Register diagnostics tools with the registry
pub fn register_tools(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_tool(notification_stream_tool())
}

#[derive(Debug, Deserialize)]
struct NotificationStreamParams {
    #[serde(default = "default_interval")]
    interval: u64,
    #[serde(default = "default_count")]
    count: u64,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_count() -> u64 {
    DEFAULT_COUNT
}

impl NotificationStreamParams {
    /// Zero asks for the maximum.
    fn effective_count(&self) -> u64 {
        if self.count == 0 {
            MAX_COUNT
        } else {
            self.count.min(MAX_COUNT)
        }
    }
}

fn notification_stream_tool() -> RegisteredTool {
    ToolBuilder::new("start-notification-stream")
        .description("Sends a series of periodic notifications for testing notification delivery")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "interval": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": MAX_INTERVAL_MS,
                    "default": DEFAULT_INTERVAL_MS,
                    "description": "Interval in milliseconds between notifications"
                },
                "count": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": MAX_COUNT,
                    "default": DEFAULT_COUNT,
                    "description": "Number of notifications to send (0 for 100)"
                }
            }
        }))
        .build_public(notification_stream)
}

async fn notification_stream(ctx: ToolContext, params: NotificationStreamParams) -> ToolResult {
    let count = params.effective_count();
    info!(
        "Notification stream started (session: {:?}, interval: {}ms, count: {})",
        ctx.session_id.as_deref(),
        params.interval,
        count
    );

    let interval = Duration::from_millis(params.interval);
    for n in 1..=count {
        ctx.notifier
            .info(format!(
                "Periodic notification #{} at {}",
                n,
                Utc::now().to_rfc3339()
            ))
            .await;
        ctx.notifier.progress(n, Some(count), None).await;

        if n < count {
            tokio::time::sleep(interval).await;
        }
    }

    Ok(ToolsCallResult::text(format!(
        "Sent {} periodic notifications every {}ms",
        count, params.interval
    )))
}
