//! Health report and version endpoints.
//!
//! The report runs every registered check on each request; the status code is
//! 200 when all checks are healthy and 503 otherwise. HEAD uses the same logic
//! without a body so load balancers can probe cheaply.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::health::HealthReport;
use crate::state::AppState;

/// Status code for a report: 200 when healthy, 503 when degraded.
pub fn status_for(report: &HealthReport) -> StatusCode {
    if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Full health report as pretty-printed JSON.
#[instrument(name = "health::report", skip(state))]
pub async fn report(State(state): State<AppState>) -> Response {
    let report = state.health.build_report().await;
    let status = status_for(&report);
    tracing::info!(status = status.as_u16(), overall = ?report.status, "Health report built");
    pretty_json(status, &report)
}

/// Same status as `report`, no body.
#[instrument(name = "health::report_head", skip(state))]
pub async fn report_head(State(state): State<AppState>) -> StatusCode {
    let report = state.health.build_report().await;
    status_for(&report)
}

/// Version metadata only; no checks are run.
pub async fn version(State(state): State<AppState>) -> Response {
    pretty_json(StatusCode::OK, state.health.version())
}

fn pretty_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (status, body).into_response(),
        Err(e) => {
            // Keep the health verdict even if the body is lost
            tracing::error!(error = %e, "Failed to serialize response body");
            status.into_response()
        }
    }
}
