//! healthcheck-server: dedicated health endpoint.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from the environment, registers the gateway check, sets up
//! the Axum router, and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthcheck_server::config::{AppConfig, DEFAULT_LOG_FILTER, DEFAULT_LOG_FORMAT, ENV_LOG_FORMAT};
use healthcheck_server::health::{CheckRegistry, GatewayCheck, HealthAggregator};
use healthcheck_server::http::start_server;
use healthcheck_server::{create_router, AppState};

/// Standalone health check server for deployment verification
#[derive(Parser, Debug)]
#[command(name = "healthcheck-server", version, about)]
struct Args {
    /// Listen port (overrides HEALTH_CHECK_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level filter (e.g., "healthcheck_server=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format: "text" or "json" (overrides LOG_FORMAT)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let log_format = args
        .log_format
        .or_else(|| std::env::var(ENV_LOG_FORMAT).ok())
        .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string());

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    tracing::info!(
        port = config.http.port,
        health_path = %config.http.health_path,
        git_sha = %config.build.git_sha,
        build_date = %config.build.build_date,
        runtime_mode = %config.runtime_mode,
        "Loaded configuration"
    );
    tracing::info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        timeout_ms = config.gateway.timeout_ms,
        "Gateway check configured"
    );

    let checks = CheckRegistry::new().with_check(Arc::new(GatewayCheck::new(config.gateway.clone())?));
    let aggregator = HealthAggregator::new(&config, checks);
    tracing::info!(checks = ?aggregator.registry().names(), "Initialized health checks");

    let state = AppState::new(config.clone(), aggregator);
    let app = create_router(state);

    // Bind failures propagate and exit nonzero
    start_server(app, &config).await?;

    tracing::info!("Server stopped");
    Ok(())
}
