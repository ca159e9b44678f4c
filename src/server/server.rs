use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::mcp_routes::make_mcp_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::mcp::handler::server_version;
use crate::mcp::McpState;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub version: String,
    pub sessions: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        version: server_version(),
        sessions: state.mcp_state.sessions.len(),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, mcp_state: Arc<McpState>) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        hash: env!("GIT_HASH").to_string(),
        mcp_state,
    };

    let home_router: Router = Router::new()
        .route("/health", get(health))
        .with_state(state.clone());

    home_router
        .merge(make_mcp_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, mcp_state: Arc<McpState>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, mcp_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("Ready to serve MCP at http://0.0.0.0:{}/mcp", port);
    Ok(axum::serve(listener, app).await?)
}
