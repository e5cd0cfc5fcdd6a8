//! Client-facing request errors.
//!
//! Downstream failures never appear here; they are reported inside the health
//! report. Only requests the router cannot serve become errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "Rejecting request");

        let body = ErrorBody {
            error: self.to_string(),
        };
        match serde_json::to_string(&body) {
            Ok(json) => (status, json).into_response(),
            Err(_) => status.into_response(),
        }
    }
}
