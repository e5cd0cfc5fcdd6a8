//! Liveness ping.
//!
//! Answers without touching any dependency, so it reports only that the
//! process can serve HTTP. The smoke test polls it while waiting for startup.

/// Constant ping body
pub const PING_BODY: &str = r#"{"status":"ok"}"#;

pub async fn ping() -> &'static str {
    PING_BODY
}
