//! Handlers for preflight requests and anything the router does not serve.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// CORS preflight: empty 200 on any path.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Unknown path. GET gets a JSON error body, HEAD only the status.
pub async fn not_found(method: Method) -> Response {
    if method == Method::HEAD {
        StatusCode::NOT_FOUND.into_response()
    } else {
        AppError::NotFound.into_response()
    }
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Router-level fallback for paths with no route.
///
/// OPTIONS is allowed everywhere, GET/HEAD on an unknown path is 404, and any
/// other method is 405 regardless of path.
pub async fn unmatched(method: Method) -> Response {
    match method {
        Method::OPTIONS => preflight().await.into_response(),
        Method::GET | Method::HEAD => not_found(method).await,
        _ => method_not_allowed().await.into_response(),
    }
}
