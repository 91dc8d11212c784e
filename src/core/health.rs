//! C9 (part 2): aggregate health check over five probes.
//!
//! Every probe is evaluated independently and a panicking probe is caught
//! and reported `unhealthy` rather than aborting the other four — the same
//! isolate-the-callback discipline [`super::session_tracker`] uses for its
//! eviction hooks.

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub status: HealthStatus,
    pub message: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub memory: ProbeResult,
    pub response_time: ProbeResult,
    pub error_rate: ProbeResult,
    pub storage: ProbeResult,
    pub security: ProbeResult,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthThresholds {
    pub max_storage_percent: f64,
    pub storage_degraded_percent: f64,
    pub max_response_time_ms: f64,
    pub response_time_degraded_ratio: f64,
    pub error_rate_degraded_percent: f64,
    pub error_rate_unhealthy_percent: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_storage_percent: 80.0,
            storage_degraded_percent: 64.0,
            max_response_time_ms: 200.0,
            response_time_degraded_ratio: 0.8,
            error_rate_degraded_percent: 2.0,
            error_rate_unhealthy_percent: 5.0,
        }
    }
}

pub struct HealthInputs {
    pub memory_used_bytes: u64,
    pub memory_limit_bytes: u64,
    pub avg_response_time: Duration,
    pub error_rate_percent: f64,
    pub storage_used: u64,
    pub storage_capacity: u64,
    pub security_incidents_last_window: u64,
}

fn safe_percent(used: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        0.0
    } else {
        (used / capacity * 100.0).clamp(0.0, 100.0)
    }
}

fn run_probe<F>(f: F) -> ProbeResult
where
    F: FnOnce() -> ProbeResult,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| ProbeResult {
        status: HealthStatus::Unhealthy,
        message: "probe panicked".to_string(),
        details: serde_json::json!({}),
    })
}

fn memory_probe(inputs: &HealthInputs) -> ProbeResult {
    run_probe(|| {
        let percent = safe_percent(inputs.memory_used_bytes as f64, inputs.memory_limit_bytes as f64);
        let status = if percent > 90.0 {
            HealthStatus::Unhealthy
        } else if percent > 75.0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ProbeResult {
            status,
            message: format!("memory at {percent:.1}% of limit"),
            details: serde_json::json!({ "percent": percent }),
        }
    })
}

fn response_time_probe(inputs: &HealthInputs, thresholds: &HealthThresholds) -> ProbeResult {
    run_probe(|| {
        let ms = inputs.avg_response_time.as_secs_f64() * 1000.0;
        let status = if ms > thresholds.max_response_time_ms {
            HealthStatus::Unhealthy
        } else if ms > thresholds.max_response_time_ms * thresholds.response_time_degraded_ratio {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ProbeResult {
            status,
            message: format!("average response time {ms:.1}ms"),
            details: serde_json::json!({ "avg_response_time_ms": ms }),
        }
    })
}

fn error_rate_probe(inputs: &HealthInputs, thresholds: &HealthThresholds) -> ProbeResult {
    run_probe(|| {
        let rate = inputs.error_rate_percent.clamp(0.0, 100.0);
        let status = if rate > thresholds.error_rate_unhealthy_percent {
            HealthStatus::Unhealthy
        } else if rate > thresholds.error_rate_degraded_percent {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ProbeResult {
            status,
            message: format!("error rate {rate:.2}%"),
            details: serde_json::json!({ "error_rate_percent": rate }),
        }
    })
}

fn storage_probe(inputs: &HealthInputs, thresholds: &HealthThresholds) -> ProbeResult {
    run_probe(|| {
        let percent = safe_percent(inputs.storage_used as f64, inputs.storage_capacity as f64);
        let status = if percent > thresholds.max_storage_percent {
            HealthStatus::Unhealthy
        } else if percent > thresholds.storage_degraded_percent {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ProbeResult {
            status,
            message: format!("storage at {percent:.1}% of capacity"),
            details: serde_json::json!({ "percent": percent }),
        }
    })
}

fn security_probe(inputs: &HealthInputs) -> ProbeResult {
    run_probe(|| {
        let status = if inputs.security_incidents_last_window > 5 {
            HealthStatus::Unhealthy
        } else if inputs.security_incidents_last_window > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ProbeResult {
            status,
            message: format!("{} security incidents in the last window", inputs.security_incidents_last_window),
            details: serde_json::json!({ "incidents": inputs.security_incidents_last_window }),
        }
    })
}

fn worst_of(statuses: &[HealthStatus]) -> HealthStatus {
    if statuses.iter().any(|s| *s == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if statuses.iter().any(|s| *s == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

pub fn check_health(inputs: &HealthInputs, thresholds: &HealthThresholds) -> HealthReport {
    let memory = memory_probe(inputs);
    let response_time = response_time_probe(inputs, thresholds);
    let error_rate = error_rate_probe(inputs, thresholds);
    let storage = storage_probe(inputs, thresholds);
    let security = security_probe(inputs);

    let status = worst_of(&[memory.status, response_time.status, error_rate.status, storage.status, security.status]);

    HealthReport {
        status,
        memory,
        response_time,
        error_rate,
        storage,
        security,
    }
}
