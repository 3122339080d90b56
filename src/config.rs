// src/config.rs

use std::env;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use secrecy::SecretString;

use crate::api::auth::AuthConfig;
use crate::blockchain::client::DEFAULT_DUNE_BASE_URL;

pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Which transports the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportMode {
    /// Streamable HTTP on `/mcp` only.
    Http,
    /// Legacy HTTP+SSE on `/sse` and `/message` only.
    Sse,
    /// Both HTTP transports on one listener.
    Hybrid,
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Http => "http",
            TransportMode::Sse => "sse",
            TransportMode::Hybrid => "hybrid",
            TransportMode::Stdio => "stdio",
        }
    }

    pub fn serves_modern(&self) -> bool {
        matches!(self, TransportMode::Http | TransportMode::Hybrid)
    }

    pub fn serves_legacy(&self) -> bool {
        matches!(self, TransportMode::Sse | TransportMode::Hybrid)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "web3_stats_mcp", version, about = "MCP gateway for the Dune Sim and Blockscout APIs")]
pub struct Cli {
    #[arg(long, value_enum, env = "MCP_TRANSPORT", default_value = "http")]
    pub transport: TransportMode,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "MCP_BIND_HOST", default_value = "::")]
    pub host: String,

    /// Print a fresh API key for MCP_API_KEYS and exit.
    #[arg(long)]
    pub generate_api_key: bool,
}

// Loaded once at startup; immutable afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,

    // Upstream settings
    pub dune_api_key: SecretString,
    pub dune_base_url: String,

    pub auth: AuthConfig,
}

impl Config {
    /// Builds the configuration from CLI flags plus the process environment.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        Self::from_lookup(cli, |key| env::var(key).ok())
    }

    pub fn from_lookup(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let dune_api_key = lookup("DUNE_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .context("DUNE_API_KEY must be set to a Dune Sim API key")?;

        let dune_base_url = lookup("DUNE_API_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DUNE_BASE_URL.to_string());
        url::Url::parse(&dune_base_url).context("DUNE_API_BASE_URL must be a valid URL")?;

        let max_body_bytes = match lookup("MCP_MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("MCP_MAX_BODY_BYTES must be a valid number")?,
            None => DEFAULT_MAX_BODY_BYTES,
        };
        if max_body_bytes == 0 {
            bail!("MCP_MAX_BODY_BYTES must be greater than zero");
        }

        let auth = AuthConfig::from_lookup(&lookup);
        if auth.enabled && auth.api_keys.is_empty() && auth.basic_credentials.is_empty() {
            bail!("MCP_AUTH_ENABLED is true but neither MCP_API_KEYS nor MCP_BASIC_AUTH is set");
        }

        Ok(Config {
            transport: cli.transport,
            host: cli.host.clone(),
            port: cli.port,
            max_body_bytes,
            dune_api_key: SecretString::new(dune_api_key),
            dune_base_url,
            auth,
        })
    }
}
