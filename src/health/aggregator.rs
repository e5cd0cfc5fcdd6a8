//! Builds `HealthReport`s from the check registry and static metadata.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use sysinfo::{Pid, System};
use tracing::instrument;

use super::{CheckRegistry, EnvironmentInfo, HealthReport, OverallStatus, VersionInfo};
use crate::config::AppConfig;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Combines check results with version, environment, and process metrics.
///
/// Version and environment info are captured once from the configuration at
/// construction; uptime and memory are read on every report.
pub struct HealthAggregator {
    registry: CheckRegistry,
    deadline: Duration,
    version: VersionInfo,
    environment: EnvironmentInfo,
    started_at: Instant,
    process: ProcessMetrics,
}

impl HealthAggregator {
    pub fn new(config: &AppConfig, registry: CheckRegistry) -> Self {
        Self::with_start_time(config, registry, Instant::now())
    }

    /// Like `new`, with an explicit process start instant.
    pub fn with_start_time(config: &AppConfig, registry: CheckRegistry, started_at: Instant) -> Self {
        Self {
            registry,
            deadline: config.gateway.check_deadline(),
            version: VersionInfo::from_config(config),
            environment: EnvironmentInfo::from_config(config),
            started_at,
            process: ProcessMetrics::new(),
        }
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run all checks and assemble a fresh report.
    #[instrument(name = "health.build_report", skip(self), fields(status))]
    pub async fn build_report(&self) -> HealthReport {
        let checks = self.registry.run_all(self.deadline).await;
        let status = OverallStatus::from_checks(checks.values());
        tracing::Span::current().record("status", tracing::field::debug(status));

        HealthReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status,
            version: self.version.clone(),
            environment: self.environment.clone(),
            checks,
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            memory_usage_mb: self.process.memory_usage_mb(),
        }
    }
}

/// Reads this process's resident memory through sysinfo.
struct ProcessMetrics {
    pid: Option<Pid>,
    system: Arc<Mutex<System>>,
}

impl ProcessMetrics {
    fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot determine current pid, memory usage will read 0");
                None
            }
        };

        Self {
            pid,
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    /// Resident memory in MiB, rounded. 0 when the process cannot be read.
    fn memory_usage_mb(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };

        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        if !system.refresh_process(pid) {
            return 0;
        }

        system
            .process(pid)
            .map(|process| bytes_to_mb(process.memory()))
            .unwrap_or(0)
    }
}

fn bytes_to_mb(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_MB).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::testing::StaticCheck;
    use crate::health::{CheckResult, CheckStatus};

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "GIT_SHA" => Some("abcdef0123456789".to_string()),
            "BUILD_DATE" => Some("2024-05-01".to_string()),
            "DEPLOYMENT_TIME" => Some("2024-05-02T10:00:00.000Z".to_string()),
            "NODE_ENV" => Some("test".to_string()),
            "OPENCLAW_GATEWAY_HOST" => Some("gateway.test".to_string()),
            "OPENCLAW_GATEWAY_PORT" => Some("4000".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_bytes_to_mb_rounds_to_nearest() {
        assert_eq!(bytes_to_mb(0), 0);
        assert_eq!(bytes_to_mb(512 * 1024), 1);
        assert_eq!(bytes_to_mb(511 * 1024), 0);
        assert_eq!(bytes_to_mb(10 * 1024 * 1024), 10);
    }

    #[tokio::test]
    async fn test_report_is_healthy_when_gateway_is() {
        let registry = CheckRegistry::new()
            .with_check(StaticCheck::new("gateway", CheckResult::healthy(5, 200)));
        let aggregator = HealthAggregator::new(&config(), registry);

        let report = aggregator.build_report().await;

        assert_eq!(report.status, OverallStatus::Healthy);
        assert_eq!(report.checks["gateway"].status, CheckStatus::Healthy);
        assert_eq!(report.version.git_sha_short, "abcdef0");
        assert_eq!(report.version.build_date, "2024-05-01");
        assert_eq!(report.environment.node_env, "test");
        assert_eq!(report.environment.gateway_host, "gateway.test");
        assert_eq!(report.environment.gateway_port, 4000);
        assert!(report.uptime_seconds >= 0.0);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_report_is_degraded_when_any_check_fails() {
        let registry = CheckRegistry::new()
            .with_check(StaticCheck::new("gateway", CheckResult::healthy(5, 200)))
            .with_check(StaticCheck::new("queue", CheckResult::timed_out(5000, "slow")));
        let aggregator = HealthAggregator::new(&config(), registry);

        let report = aggregator.build_report().await;

        assert_eq!(report.status, OverallStatus::Degraded);
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_uptime_counts_from_start_time() {
        let started = Instant::now() - Duration::from_secs(90);
        let aggregator = HealthAggregator::with_start_time(&config(), CheckRegistry::new(), started);

        let report = aggregator.build_report().await;

        assert!(report.uptime_seconds >= 90.0);
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn test_report_serializes_expected_shape() {
        let registry = CheckRegistry::new().with_check(StaticCheck::new(
            "gateway",
            CheckResult::unreachable(2, "Connection refused"),
        ));
        let aggregator = HealthAggregator::new(&config(), registry);

        let body = serde_json::to_value(aggregator.build_report().await).unwrap();

        assert_eq!(body["status"], "degraded");
        assert_eq!(body["version"]["git_sha"], "abcdef0123456789");
        assert_eq!(body["environment"]["gateway_port"], 4000);
        assert_eq!(body["checks"]["gateway"]["status"], "unreachable");
        assert_eq!(body["checks"]["gateway"]["error"], "Connection refused");
        assert!(body["uptime_seconds"].is_number());
        assert!(body["memory_usage_mb"].is_u64());
    }
}
