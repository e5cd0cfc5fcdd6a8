//! Downstream connectivity probe.
//!
//! Issues a single `GET /` against the gateway and classifies the outcome.
//! The request future is raced against a timer; when the timer wins the
//! future is dropped, which aborts the in-flight connection.

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::instrument;

use super::registry::HealthCheck;
use super::CheckResult;
use crate::config::GatewayConfig;

/// Registry name of the gateway check
pub const GATEWAY_CHECK_NAME: &str = "gateway";

/// Error reported when the gateway does not answer in time
pub const GATEWAY_TIMEOUT_MESSAGE: &str = "Gateway health check timed out";

/// Probe `http://host:port/` once.
///
/// Latency is measured from request start until response headers arrive (or
/// until the failure/timeout). Any HTTP status counts as reachable.
#[instrument(name = "health.probe", skip(client), fields(latency_ms))]
pub async fn probe(
    client: &reqwest::Client,
    host: &str,
    port: u16,
    timeout: Duration,
) -> CheckResult {
    let url = format!("http://{host}:{port}/");
    let start = Instant::now();

    let outcome = tokio::time::timeout(timeout, client.get(&url).send()).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency_ms);

    match outcome {
        Ok(Ok(response)) => {
            let status_code = response.status().as_u16();
            tracing::debug!(%url, status_code, latency_ms, "Downstream responded");
            CheckResult::healthy(latency_ms, status_code)
        }
        Ok(Err(e)) if e.is_timeout() => {
            tracing::warn!(%url, latency_ms, "Downstream probe timed out");
            CheckResult::timed_out(latency_ms, GATEWAY_TIMEOUT_MESSAGE)
        }
        Ok(Err(e)) => {
            let error = describe_error(&e);
            tracing::warn!(%url, latency_ms, %error, "Downstream unreachable");
            CheckResult::unreachable(latency_ms, error)
        }
        Err(_) => {
            tracing::warn!(%url, latency_ms, "Downstream probe timed out");
            CheckResult::timed_out(latency_ms, GATEWAY_TIMEOUT_MESSAGE)
        }
    }
}

/// Flatten an error and its sources into one line.
///
/// reqwest's top-level message only names the URL; the useful part
/// ("Connection refused", DNS failure) lives in the source chain.
fn describe_error(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Connectivity check against the configured gateway.
pub struct GatewayCheck {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayCheck {
    /// Build the check with its own HTTP client.
    ///
    /// Proxies and redirects are disabled so the probe measures the direct
    /// path to the gateway.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HealthCheck for GatewayCheck {
    fn name(&self) -> &str {
        GATEWAY_CHECK_NAME
    }

    async fn check(&self) -> CheckResult {
        probe(
            &self.client,
            &self.config.host,
            self.config.port,
            self.config.timeout(),
        )
        .await
    }
}
