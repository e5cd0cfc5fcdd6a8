//! HTTP server startup logic.
//!
//! Binds all interfaces on the configured port and serves the router with
//! peer addresses attached, so request logs can name the remote client.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::AppConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to serve on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Address the server listens on for a given configuration.
pub fn listen_addr(config: &AppConfig) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], config.http.port))
}

/// Start the HTTP server.
///
/// This function blocks until the server shuts down. Bind failures are
/// returned immediately; the caller treats them as fatal.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    let addr = listen_addr(config);
    let handle = Handle::new();

    tracing::info!(%addr, "Starting health check server");

    shutdown::setup_shutdown_handler(handle.clone());
    spawn_listening_log(handle.clone(), config.http.health_path.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|source| {
            tracing::error!(%addr, error = %source, "Server error");
            ServerError::Serve { addr, source }
        })
}

/// Log the bound address and health endpoint once the listener is up.
fn spawn_listening_log(handle: Handle, health_path: String) {
    tokio::spawn(async move {
        if let Some(addr) = handle.listening().await {
            tracing::info!(%addr, "Server listening");
            tracing::info!("Health check endpoint: http://{}{}", addr, health_path);
        }
    });
}
