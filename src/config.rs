//! Configuration loading and constants.
//!
//! Loads the health check server configuration from environment variables and
//! defines defaults for the listen port, health path, gateway address, probe
//! timeout, and logging. `AppConfig` is the root configuration struct; it is
//! built once at startup and shared read-only afterwards.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};

// =============================================================================
// Environment Keys
// =============================================================================

pub const ENV_PORT: &str = "HEALTH_CHECK_PORT";
pub const ENV_PATH: &str = "HEALTH_CHECK_PATH";
pub const ENV_TIMEOUT_MS: &str = "HEALTH_CHECK_TIMEOUT_MS";
pub const ENV_BUILD_DATE: &str = "BUILD_DATE";
pub const ENV_GIT_SHA: &str = "GIT_SHA";
pub const ENV_DEPLOYMENT_TIME: &str = "DEPLOYMENT_TIME";
pub const ENV_GATEWAY_HOST: &str = "OPENCLAW_GATEWAY_HOST";
pub const ENV_GATEWAY_PORT: &str = "OPENCLAW_GATEWAY_PORT";
pub const ENV_RUNTIME_MODE: &str = "NODE_ENV";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

// =============================================================================
// Defaults
// =============================================================================

/// Default port for the health check listener
pub const DEFAULT_PORT: u16 = 8888;

/// Default path serving the full health report
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Default downstream probe timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Extra time granted to the check registry beyond the probe timeout
pub const CHECK_DEADLINE_GRACE_MS: u64 = 500;

/// Fallback for build metadata that was not injected
pub const UNKNOWN: &str = "unknown";

/// Default runtime mode
pub const DEFAULT_RUNTIME_MODE: &str = "development";

/// Default gateway host
pub const DEFAULT_GATEWAY_HOST: &str = "localhost";

/// Default gateway port
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Number of characters kept in the short git SHA
pub const GIT_SHA_SHORT_LEN: usize = 7;

/// Seconds to wait for open connections on shutdown
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "healthcheck_server=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listener configuration
    pub http: HttpServerConfig,
    /// Downstream gateway to probe
    pub gateway: GatewayConfig,
    /// Build and deployment metadata
    pub build: BuildInfo,
    /// Runtime mode reported as `node_env`
    pub runtime_mode: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub port: u16,
    /// Path serving the full health report (always starts with `/`)
    pub health_path: String,
}

/// Downstream gateway address and probe timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Deadline shared by all checks of a single report.
    pub fn check_deadline(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.saturating_add(CHECK_DEADLINE_GRACE_MS))
    }
}

/// Build-time identifiers injected into the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub git_sha: String,
    pub build_date: String,
    pub deployment_time: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. Numeric values that fail to parse
    /// are rejected rather than silently replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(ENV_PORT, get(ENV_PORT), DEFAULT_PORT)?;
        let health_path = normalize_path(get(ENV_PATH).as_deref().unwrap_or(DEFAULT_HEALTH_PATH));
        validate_health_path(&health_path)?;
        let timeout_ms = parse_or(ENV_TIMEOUT_MS, get(ENV_TIMEOUT_MS), DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "{ENV_TIMEOUT_MS} must be greater than zero"
            )));
        }

        let gateway = GatewayConfig {
            host: get(ENV_GATEWAY_HOST).unwrap_or_else(|| DEFAULT_GATEWAY_HOST.to_string()),
            port: parse_or(ENV_GATEWAY_PORT, get(ENV_GATEWAY_PORT), DEFAULT_GATEWAY_PORT)?,
            timeout_ms,
        };

        let build = BuildInfo {
            git_sha: get(ENV_GIT_SHA).unwrap_or_else(|| UNKNOWN.to_string()),
            build_date: get(ENV_BUILD_DATE).unwrap_or_else(|| UNKNOWN.to_string()),
            deployment_time: get(ENV_DEPLOYMENT_TIME)
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };

        Ok(Self {
            http: HttpServerConfig { port, health_path },
            gateway,
            build,
            runtime_mode: get(ENV_RUNTIME_MODE).unwrap_or_else(|| DEFAULT_RUNTIME_MODE.to_string()),
        })
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match value {
        Some(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        }
        None => Ok(default),
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// The health path is matched literally, so router syntax is not allowed in it.
fn validate_health_path(path: &str) -> Result<(), ConfigError> {
    if path.contains(['{', '}']) {
        return Err(ConfigError::Validation(format!(
            "{ENV_PATH} must not contain '{{' or '}}': {path:?}"
        )));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(ConfigError::Validation(format!(
            "{ENV_PATH} segments must not start with ':' or '*': {path:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} is not a valid number")]
    InvalidNumber { key: &'static str, value: String },
    #[error("Configuration error: {0}")]
    Validation(String),
}
