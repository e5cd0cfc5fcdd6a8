//! Health data model and aggregation.
//!
//! A `HealthReport` combines the outcome of every registered check with static
//! build metadata and live process metrics. Probe failures are represented as
//! data (`CheckStatus::Unreachable` / `CheckStatus::Timeout`), never as errors,
//! so building a report cannot fail because a dependency is down.

mod aggregator;
mod probe;
mod registry;

pub use aggregator::HealthAggregator;
pub use probe::{probe, GatewayCheck, GATEWAY_CHECK_NAME, GATEWAY_TIMEOUT_MESSAGE};
pub use registry::{CheckRegistry, HealthCheck};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{AppConfig, GIT_SHA_SHORT_LEN};

/// Outcome classification of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unreachable,
    Timeout,
}

/// Result of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// A response was received; any status code counts as reachable.
    pub fn healthy(latency_ms: u64, status_code: u16) -> Self {
        Self {
            status: CheckStatus::Healthy,
            latency_ms,
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn unreachable(latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Unreachable,
            latency_ms,
            status_code: None,
            error: Some(error.into()),
        }
    }

    pub fn timed_out(latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Timeout,
            latency_ms,
            status_code: None,
            error: Some(message.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Healthy
    }
}

/// Aggregate verdict over all checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

impl OverallStatus {
    /// Healthy iff every check is healthy. An empty set is healthy.
    pub fn from_checks<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a CheckResult>,
    {
        if results.into_iter().all(CheckResult::is_healthy) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        }
    }
}

/// Build and deployment identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub git_sha: String,
    pub git_sha_short: String,
    pub build_date: String,
    pub deployment_time: String,
}

impl VersionInfo {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            git_sha: config.build.git_sha.clone(),
            git_sha_short: short_sha(&config.build.git_sha),
            build_date: config.build.build_date.clone(),
            deployment_time: config.build.deployment_time.clone(),
        }
    }
}

/// Runtime environment reported alongside the checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub node_env: String,
    pub gateway_host: String,
    pub gateway_port: u16,
}

impl EnvironmentInfo {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            node_env: config.runtime_mode.clone(),
            gateway_host: config.gateway.host.clone(),
            gateway_port: config.gateway.port,
        }
    }
}

/// Full health report served on the health path.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: String,
    pub status: OverallStatus,
    pub version: VersionInfo,
    pub environment: EnvironmentInfo,
    pub checks: BTreeMap<String, CheckResult>,
    pub uptime_seconds: f64,
    pub memory_usage_mb: u64,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }
}

/// First `GIT_SHA_SHORT_LEN` characters of a SHA, or all of it when shorter.
pub fn short_sha(sha: &str) -> String {
    sha.chars().take(GIT_SHA_SHORT_LEN).collect()
}
