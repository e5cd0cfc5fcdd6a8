//! healthcheck-server: a standalone health endpoint for deployment verification.
//!
//! Reports process liveness, build metadata, and the reachability of the
//! downstream gateway, on its own port and independent of the main
//! application server.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
