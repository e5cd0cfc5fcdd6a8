//! Gateway probe tests against real sockets.
//!
//! Each test starts a throwaway gateway on 127.0.0.1 (or reserves a port with
//! nothing listening) and probes it through the real HTTP client.
//!
//! Run with: cargo test --test gateway_probe
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use healthcheck_server::config::AppConfig;
use healthcheck_server::health::{
    probe, CheckRegistry, CheckStatus, GatewayCheck, HealthAggregator, GATEWAY_TIMEOUT_MESSAGE,
};
use healthcheck_server::{create_router, AppState};

/// Start a gateway that answers `GET /` with `status` after `delay`.
async fn spawn_gateway(status: StatusCode, delay: Duration) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/",
        get(move || async move {
            tokio::time::sleep(delay).await;
            status
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// A port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn config_for(port: u16, timeout_ms: u64) -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "OPENCLAW_GATEWAY_HOST" => Some("127.0.0.1".to_string()),
        "OPENCLAW_GATEWAY_PORT" => Some(port.to_string()),
        "HEALTH_CHECK_TIMEOUT_MS" => Some(timeout_ms.to_string()),
        _ => None,
    })
    .unwrap()
}

async fn get_health(config: AppConfig) -> (StatusCode, serde_json::Value) {
    let check = GatewayCheck::new(config.gateway.clone()).unwrap();
    let registry = CheckRegistry::new().with_check(Arc::new(check));
    let aggregator = HealthAggregator::new(&config, registry);
    let app = create_router(AppState::new(config, aggregator));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn probe_reports_healthy_with_status_code() {
    let addr = spawn_gateway(StatusCode::OK, Duration::ZERO).await;

    let result = probe(&client(), "127.0.0.1", addr.port(), Duration::from_secs(2)).await;

    assert_eq!(result.status, CheckStatus::Healthy);
    assert_eq!(result.status_code, Some(200));
    assert!(result.error.is_none());
    assert!(result.latency_ms < 2000);
}

#[tokio::test]
async fn probe_treats_error_status_as_reachable() {
    let addr = spawn_gateway(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;

    let result = probe(&client(), "127.0.0.1", addr.port(), Duration::from_secs(2)).await;

    assert_eq!(result.status, CheckStatus::Healthy);
    assert_eq!(result.status_code, Some(500));
}

#[tokio::test]
async fn probe_reports_refused_connection_as_unreachable() {
    let port = closed_port();

    let result = probe(&client(), "127.0.0.1", port, Duration::from_secs(2)).await;

    assert_eq!(result.status, CheckStatus::Unreachable);
    assert!(result.status_code.is_none());
    let error = result.error.expect("unreachable result carries an error");
    assert!(!error.is_empty());
}

#[tokio::test]
async fn probe_times_out_and_measures_about_the_timeout() {
    let addr = spawn_gateway(StatusCode::OK, Duration::from_secs(10)).await;
    let timeout = Duration::from_millis(200);

    let result = probe(&client(), "127.0.0.1", addr.port(), timeout).await;

    assert_eq!(result.status, CheckStatus::Timeout);
    assert_eq!(result.error.as_deref(), Some(GATEWAY_TIMEOUT_MESSAGE));
    assert!(result.status_code.is_none());
    assert!(result.latency_ms >= 200, "latency {}", result.latency_ms);
    assert!(result.latency_ms < 2000, "latency {}", result.latency_ms);
}

#[tokio::test]
async fn health_endpoint_is_200_when_gateway_answers() {
    let addr = spawn_gateway(StatusCode::NOT_FOUND, Duration::ZERO).await;

    let (status, body) = get_health(config_for(addr.port(), 2000)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["gateway"]["status"], "healthy");
    assert_eq!(body["checks"]["gateway"]["status_code"], 404);
    assert_eq!(body["environment"]["gateway_port"], addr.port());
}

#[tokio::test]
async fn health_endpoint_is_503_when_gateway_refuses() {
    let (status, body) = get_health(config_for(closed_port(), 2000)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["gateway"]["status"], "unreachable");
    assert!(body["checks"]["gateway"]["error"].is_string());
    assert!(body["checks"]["gateway"].get("status_code").is_none());
}

#[tokio::test]
async fn health_endpoint_is_503_when_gateway_is_slow() {
    let addr = spawn_gateway(StatusCode::OK, Duration::from_secs(10)).await;

    let (status, body) = get_health(config_for(addr.port(), 300)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["gateway"]["status"], "timeout");
    assert_eq!(body["checks"]["gateway"]["error"], GATEWAY_TIMEOUT_MESSAGE);
    let latency = body["checks"]["gateway"]["latency_ms"].as_u64().unwrap();
    assert!((300..2000).contains(&latency), "latency {latency}");
}
