//! Health report for `GET /api/health`

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

/// Build environment summary included in the health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub has_api_key: bool,
    pub port: u16,
}

impl EnvironmentInfo {
    pub fn current(has_api_key: bool, port: u16) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            has_api_key,
            port,
        }
    }
}

/// Body of a healthy response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
    /// Resident memory in MB, when the platform reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    pub environment: EnvironmentInfo,
}

impl HealthReport {
    pub fn collect(started: Instant, environment: EnvironmentInfo) -> Self {
        Self {
            status: "healthy",
            timestamp: timestamp(),
            uptime: started.elapsed().as_secs_f64(),
            memory: resident_memory_mb(),
            environment,
        }
    }
}

/// Body of the 503 response.
pub fn unhealthy_body(error: &str) -> String {
    json!({
        "status": "unhealthy",
        "timestamp": timestamp(),
        "error": error,
    })
    .to_string()
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resident set size from `/proc/self/status`, in MB.
fn resident_memory_mb() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_kb(&status).map(|kb| (kb as f64 / 1024.0 * 100.0).round() / 100.0)
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
