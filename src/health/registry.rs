//! Named set of health checks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::Instant;

use super::CheckResult;

/// A single named dependency check.
///
/// Implementations must always resolve to a `CheckResult`; failures are
/// reported through the result's status, not through errors or panics.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> CheckResult;
}

/// Ordered collection of checks run together for each report.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check. A later check with the same name replaces the earlier one.
    pub fn register(&mut self, check: Arc<dyn HealthCheck>) {
        self.checks.retain(|existing| existing.name() != check.name());
        self.checks.push(check);
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.register(check);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check once, concurrently, under a shared deadline.
    ///
    /// Returns only after all checks have resolved. A check still running when
    /// the deadline passes is dropped and recorded as timed out.
    pub async fn run_all(&self, deadline: Duration) -> BTreeMap<String, CheckResult> {
        let start = Instant::now();

        let runs = self.checks.iter().map(|check| {
            let check = Arc::clone(check);
            async move {
                let result = match tokio::time::timeout(deadline, check.check()).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(check = check.name(), "Check exceeded shared deadline");
                        CheckResult::timed_out(
                            start.elapsed().as_millis() as u64,
                            format!("{} health check timed out", check.name()),
                        )
                    }
                };
                (check.name().to_string(), result)
            }
        });

        join_all(runs).await.into_iter().collect()
    }
}
