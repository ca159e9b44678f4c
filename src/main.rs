use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use restaurant_mcp::auth::{AuthGate, CredentialStore, InMemoryCredentialStore, TokenValidator};
use restaurant_mcp::backend::BackendClient;
use restaurant_mcp::config::{
    AppConfig, CliConfig, FileConfig, Transport, DEFAULT_BACKEND_URL, DEFAULT_PORT,
};
use restaurant_mcp::mcp::create_mcp_state;
use restaurant_mcp::server::{run_server, run_stdio, RequestsLoggingLevel};

#[derive(Parser, Debug)]
#[clap(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL of the restaurant backend API.
    #[clap(long, env = "BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Timeout in seconds for backend requests. No timeout when unset.
    #[clap(long)]
    pub backend_timeout_sec: Option<u64>,

    /// Shared secret used to verify HS256 bearer tokens.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Reject tokens that carry no `exp` claim.
    #[clap(long)]
    pub require_token_expiry: bool,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// How MCP clients connect.
    #[clap(long, value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Bearer token presented on every message of the stdio transport.
    #[clap(long, env = "MCP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            logging_level: self.logging_level.clone(),
            transport: self.transport,
            backend_url: self.backend_url.clone(),
            backend_timeout_sec: self.backend_timeout_sec,
            jwt_secret: self.jwt_secret.clone(),
            require_token_expiry: self.require_token_expiry,
            token: self.token.clone(),
        }
    }
}

fn init_logging(transport: Transport) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();

    // stdout belongs to the protocol in stdio mode
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match transport {
        Transport::Stdio => tracing_subscriber::registry()
            .with(layer.with_ansi(false))
            .with(filter)
            .try_init(),
        Transport::Http => tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init(),
    }
    .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    init_logging(config.transport)?;
    info!(
        "Starting restaurant MCP server {}-{} ({} transport)",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        config.transport
    );

    let credentials: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let validator = TokenValidator::new(&config.jwt_secret, config.require_token_expiry);
    let gate = Arc::new(AuthGate::new(validator, credentials.clone()));

    info!("Restaurant backend configured at {}", config.backend_url);
    let backend = Arc::new(
        BackendClient::new(&config.backend_url, config.backend_timeout_sec)
            .context("Failed to create backend client")?,
    );

    let mcp_state = Arc::new(create_mcp_state(credentials, backend, gate)?);

    match config.transport {
        Transport::Http => run_server(config.server_config(), mcp_state).await,
        Transport::Stdio => run_stdio(mcp_state, config.stdio_token.clone()).await,
    }
}
