//! HTTP route handlers for the health check server.
//!
//! Dispatches on (method, path): the health path and `/` serve the full
//! report, `/version` and `/ping` answer without running checks, OPTIONS is
//! accepted everywhere, and everything else is 404 or 405. Every response
//! carries permissive CORS headers and a JSON content type.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod fallback;
pub mod health;
pub mod ping;

use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use http::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

pub const VERSION_PATH: &str = "/version";
pub const PING_PATH: &str = "/ping";
pub const ROOT_PATH: &str = "/";

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Attach OPTIONS and the 405 fallback to a route's method router.
fn with_defaults(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .options(fallback::preflight)
        .fallback(fallback::method_not_allowed)
}

fn always(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Creates the Axum router with all routes and response headers.
///
/// The configured health path wins over the fixed routes it collides with.
pub fn create_router(state: AppState) -> Router {
    let health_path = state.config.http.health_path.clone();

    let report = with_defaults(get(health::report).head(health::report_head));

    let mut router = Router::new().route(&health_path, report.clone());

    if health_path != ROOT_PATH {
        router = router.route(ROOT_PATH, report);
    }

    // HEAD is only served on the health path
    if health_path != VERSION_PATH {
        router = router.route(
            VERSION_PATH,
            with_defaults(get(health::version).head(fallback::not_found)),
        );
    }

    if health_path != PING_PATH {
        router = router.route(
            PING_PATH,
            with_defaults(get(ping::ping).head(fallback::not_found)),
        );
    }

    router
        .fallback(fallback::unmatched)
        .with_state(state)
        .layer(always(ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN))
        .layer(always(ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS))
        .layer(always(CONTENT_TYPE, JSON_CONTENT_TYPE))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
