//! HTTP server module.
//!
//! The server includes:
//! - Plain HTTP listener on all interfaces
//! - Graceful shutdown on SIGTERM/SIGINT

mod server;
mod shutdown;

pub use server::{listen_addr, start_server, ServerError};
