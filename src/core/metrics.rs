//! C9 (part 1): request/response counters and thought statistics.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct MetricsState {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    avg_response_time_ms: f64,
    request_timestamps: Vec<Instant>,
    total_thoughts: u64,
    total_thought_length: u64,
    revisions: u64,
    branches: u64,
    security_incident_timestamps: Vec<Instant>,
}

/// Smoothing factor for the exponential moving average of response times.
const EMA_ALPHA: f64 = 0.2;

pub struct MetricsCollector {
    state: Mutex<MetricsState>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MetricsState {
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                avg_response_time_ms: 0.0,
                request_timestamps: Vec::new(),
                total_thoughts: 0,
                total_thought_length: 0,
                revisions: 0,
                branches: 0,
                security_incident_timestamps: Vec::new(),
            }),
        }
    }

    pub fn record_request(&self, success: bool, elapsed: Duration) {
        let mut state = self.state.lock();
        state.total_requests += 1;
        if success {
            state.successful_requests += 1;
        } else {
            state.failed_requests += 1;
        }
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        state.avg_response_time_ms = if state.total_requests == 1 {
            elapsed_ms
        } else {
            EMA_ALPHA * elapsed_ms + (1.0 - EMA_ALPHA) * state.avg_response_time_ms
        };
        state.request_timestamps.push(Instant::now());
    }

    pub fn record_thought(&self, text_len: usize, is_revision: bool, has_branch: bool) {
        let mut state = self.state.lock();
        state.total_thoughts += 1;
        state.total_thought_length += text_len as u64;
        if is_revision {
            state.revisions += 1;
        }
        if has_branch {
            state.branches += 1;
        }
    }

    pub fn requests_per_minute(&self) -> f64 {
        let mut state = self.state.lock();
        let cutoff = Instant::now() - Duration::from_secs(60);
        state.request_timestamps.retain(|t| *t >= cutoff);
        state.request_timestamps.len() as f64
    }

    /// Record a `Security`-category failure for the health checker's
    /// security probe.
    pub fn record_security_incident(&self) {
        self.state.lock().security_incident_timestamps.push(Instant::now());
    }

    pub fn security_incidents_last_minute(&self) -> u64 {
        let mut state = self.state.lock();
        let cutoff = Instant::now() - Duration::from_secs(60);
        state.security_incident_timestamps.retain(|t| *t >= cutoff);
        state.security_incident_timestamps.len() as u64
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        let error_rate = if state.total_requests == 0 {
            0.0
        } else {
            (state.failed_requests as f64 / state.total_requests as f64) * 100.0
        }
        .clamp(0.0, 100.0);

        let avg_thought_length = if state.total_thoughts == 0 {
            0.0
        } else {
            state.total_thought_length as f64 / state.total_thoughts as f64
        };

        MetricsSnapshot {
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            avg_response_time_ms: state.avg_response_time_ms,
            error_rate_percent: error_rate,
            total_thoughts: state.total_thoughts,
            avg_thought_length,
            revisions: state.revisions,
            branches: state.branches,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: f64,
    pub error_rate_percent: f64,
    pub total_thoughts: u64,
    pub avg_thought_length: f64,
    pub revisions: u64,
    pub branches: u64,
}
