mod file_config;

pub use file_config::{BackendConfig, FileConfig, StdioConfig};

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9000/api/v1";

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Transport {
    /// Streamable HTTP on `/mcp`
    #[default]
    Http,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::Stdio => write!(f, "stdio"),
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub transport: Transport,
    pub backend_url: String,
    pub backend_timeout_sec: Option<u64>,
    pub jwt_secret: Option<String>,
    pub require_token_expiry: bool,
    pub token: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            logging_level: RequestsLoggingLevel::default(),
            transport: Transport::default(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_timeout_sec: None,
            jwt_secret: None,
            require_token_expiry: false,
            token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub transport: Transport,

    // Restaurant backend
    pub backend_url: String,
    /// No client-side timeout when unset
    pub backend_timeout_sec: Option<u64>,

    // Token verification
    pub jwt_secret: String,
    pub require_token_expiry: bool,

    /// Credential for the stdio transport
    pub stdio_token: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let backend = file.backend.unwrap_or_default();
        let stdio = file.stdio.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let transport = match file.transport {
            Some(s) => match Transport::from_str(&s, true) {
                Ok(transport) => transport,
                Err(_) => bail!("Unknown transport in config file: {}", s),
            },
            None => cli.transport,
        };

        let backend_url = backend
            .url
            .unwrap_or_else(|| cli.backend_url.clone())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            bail!(
                "Backend URL must start with http:// or https://, got {:?}",
                backend_url
            );
        }
        let backend_timeout_sec = backend.timeout_sec.or(cli.backend_timeout_sec);

        let jwt_secret = file
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "jwt_secret must be specified via --jwt-secret, JWT_SECRET or in config file"
                )
            })?;

        let require_token_expiry = file
            .require_token_expiry
            .unwrap_or(cli.require_token_expiry);

        let stdio_token = stdio
            .token
            .or_else(|| cli.token.clone())
            .filter(|s| !s.trim().is_empty());
        if transport == Transport::Stdio && stdio_token.is_none() {
            warn!("No token configured for the stdio transport, every tool call will be rejected");
        }

        Ok(Self {
            port,
            logging_level,
            transport,
            backend_url,
            backend_timeout_sec,
            jwt_secret,
            require_token_expiry,
            stdio_token,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
