// src/lib.rs

use std::sync::Arc;
use std::time::Instant;

pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod transport;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Live sessions of both HTTP transport generations
    pub sessions: Arc<transport::session::SessionRegistry>,
    /// Handles every decoded JSON-RPC request
    pub rpc: Arc<dyn transport::RpcService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: config::Config, rpc: Arc<dyn transport::RpcService>) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(transport::session::SessionRegistry::new()),
            rpc,
            started_at: Instant::now(),
        }
    }
}
