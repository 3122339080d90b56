// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web3_stats_mcp::{
    api::{auth::generate_api_key, build_app},
    blockchain::UpstreamClient,
    config::{Cli, Config, TransportMode},
    mcp::McpHandler,
    transport::{stdio, RpcService},
    AppState,
};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let sessions = state.sessions.clone();
    let app = build_app(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr().context("listener has no local address")?;

    info!("🚀 HTTP Server listening on {} (transport: {})", addr, config.transport.as_str());
    if config.transport.serves_modern() {
        info!("   streamable HTTP: http://{}/mcp", addr);
    }
    if config.transport.serves_legacy() {
        info!("   legacy SSE: http://{}/sse (POST /message)", addr);
    }
    if config.auth.enabled {
        info!("🔒 Authentication enabled");
    } else {
        warn!("Authentication disabled; set MCP_AUTH_ENABLED=true to require credentials");
    }

    // Open SSE streams only end once their session is cancelled, so close
    // every session as soon as the signal arrives.
    let shutdown = async move {
        shutdown_signal().await;
        let closed = sessions.close_all();
        info!("Closed {} session(s)", closed);
    };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    // .env must be loaded before RUST_LOG and clap's env fallbacks are read
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web3_stats_mcp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.generate_api_key {
        println!("{}", generate_api_key());
        return;
    }

    // Load configuration
    let config = match Config::from_env(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let client = UpstreamClient::new(config.dune_api_key.clone(), config.dune_base_url.clone());
    let rpc: Arc<dyn RpcService> = Arc::new(McpHandler::new(client));

    if config.transport == TransportMode::Stdio {
        stdio::run(rpc).await;
        return;
    }

    let app_state = AppState::new(config, rpc);
    if let Err(e) = run_http_server(app_state).await {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
