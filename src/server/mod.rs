pub mod config;
mod http_layers;
pub mod mcp_routes;
pub mod server;
pub mod state;
pub mod stdio;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::run_server;
pub use stdio::run_stdio;
