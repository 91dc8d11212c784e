//! C2: per-session access timestamps and sliding-window rate limiting.
//!
//! TTL sweep via `last_accessed` + `retain`, plus an atomic check-and-record
//! rate gate and panic-isolated eviction subscribers.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct SessionEntry {
    last_access: Instant,
    request_timestamps: Vec<Instant>,
}

type EvictionHook = Box<dyn Fn(&str) + Send + Sync>;
type CleanupHook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStats {
    pub tracked_count: usize,
    pub active_count: usize,
    pub oldest_session_age_secs: Option<f64>,
    pub average_session_age_secs: Option<f64>,
}

pub struct SessionTracker {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    max_tracked_sessions: usize,
    session_expiry: Duration,
    rate_window: Duration,
    on_eviction: Mutex<Vec<EvictionHook>>,
    on_periodic_cleanup: Mutex<Vec<CleanupHook>>,
}

impl SessionTracker {
    pub fn new(max_tracked_sessions: usize, session_expiry: Duration, rate_window: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_tracked_sessions,
            session_expiry,
            rate_window,
            on_eviction: Mutex::new(Vec::new()),
            on_periodic_cleanup: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe_eviction<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_eviction.lock().push(Box::new(hook));
    }

    pub fn subscribe_periodic_cleanup<F>(&self, hook: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_periodic_cleanup.lock().push(Box::new(hook));
    }

    /// Record a thought for `session_id` without rate-gating it. Triggers a
    /// proactive `cleanup()` once the tracker passes 90% capacity.
    pub fn record_thought(&self, session_id: &str) {
        let should_cleanup = {
            let mut sessions = self.sessions.lock();
            let now = Instant::now();
            let entry = sessions
                .entry(session_id.to_string())
                .or_insert_with(|| SessionEntry {
                    last_access: now,
                    request_timestamps: Vec::new(),
                });
            entry.last_access = now;
            entry.request_timestamps.push(now);
            sessions.len() as f64 > self.max_tracked_sessions as f64 * 0.9
        };
        if should_cleanup {
            self.cleanup();
        }
    }

    /// Atomic prune-then-check-then-record: closes the check-then-act race
    /// a separate "check" and "record" call pair would leave open.
    pub fn check_and_record(&self, session_id: &str, max_requests: u32) -> bool {
        let mut sessions = self.sessions.lock();
        let now = Instant::now();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                last_access: now,
                request_timestamps: Vec::new(),
            });

        Self::prune_window(&mut entry.request_timestamps, now, self.rate_window);

        if entry.request_timestamps.len() as u32 >= max_requests {
            entry.last_access = now;
            return false;
        }

        entry.request_timestamps.push(now);
        entry.last_access = now;
        true
    }

    /// Drop the prefix of timestamps that fall outside the rate window in
    /// one splice rather than repeatedly popping the front.
    fn prune_window(timestamps: &mut Vec<Instant>, now: Instant, window: Duration) {
        let cutoff = now.checked_sub(window).unwrap_or(now);
        let first_in_window = timestamps.partition_point(|t| *t < cutoff);
        if first_in_window > 0 {
            timestamps.drain(0..first_in_window);
        }
    }

    /// Whether `session_id` is still tracked and within its expiry window.
    /// Used by the processor to decide which per-session reasoning trees
    /// survive a cleanup sweep.
    pub fn is_active(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock();
        let now = Instant::now();
        sessions
            .get(session_id)
            .is_some_and(|e| now.duration_since(e.last_access) <= self.session_expiry)
    }

    pub fn active_count(&self) -> usize {
        let sessions = self.sessions.lock();
        let now = Instant::now();
        sessions
            .values()
            .filter(|e| now.duration_since(e.last_access) <= self.session_expiry)
            .count()
    }

    pub fn tracked_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Aggregate session-age view, folded into the status/health snapshot.
    pub fn stats(&self) -> SessionStats {
        let sessions = self.sessions.lock();
        let now = Instant::now();
        let active_count = sessions
            .values()
            .filter(|e| now.duration_since(e.last_access) <= self.session_expiry)
            .count();
        let ages: Vec<f64> = sessions
            .values()
            .map(|e| now.duration_since(e.last_access).as_secs_f64())
            .collect();
        let oldest_session_age_secs = ages.iter().cloned().fold(None, |acc: Option<f64>, a| {
            Some(acc.map_or(a, |m| m.max(a)))
        });
        let average_session_age_secs = if ages.is_empty() {
            None
        } else {
            Some(ages.iter().sum::<f64>() / ages.len() as f64)
        };

        SessionStats {
            tracked_count: sessions.len(),
            active_count,
            oldest_session_age_secs,
            average_session_age_secs,
        }
    }

    /// Evict expired sessions, then (if still at capacity) evict
    /// oldest-accessed entries down to a small headroom below capacity.
    /// Subscriber callbacks are invoked outside the lock and never abort
    /// the sweep, even if one panics.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut evicted_ids: Vec<String> = Vec::new();

        {
            let mut sessions = self.sessions.lock();
            let before = sessions.len();

            sessions.retain(|id, entry| {
                let expired = now.duration_since(entry.last_access) > self.session_expiry;
                if expired {
                    evicted_ids.push(id.clone());
                }
                !expired
            });
            debug!(
                "session cleanup: removed {} expired of {}",
                before - sessions.len(),
                before
            );

            let headroom = (self.max_tracked_sessions / 20).max(1);
            let target = self.max_tracked_sessions.saturating_sub(headroom);
            if sessions.len() > target {
                let mut by_access: Vec<(String, Instant)> = sessions
                    .iter()
                    .map(|(id, e)| (id.clone(), e.last_access))
                    .collect();
                by_access.sort_by_key(|(_, last_access)| *last_access);
                let overflow = sessions.len() - target;
                for (id, _) in by_access.into_iter().take(overflow) {
                    sessions.remove(&id);
                    evicted_ids.push(id);
                }
            }
        }

        for id in &evicted_ids {
            for hook in self.on_eviction.lock().iter() {
                if catch_unwind(AssertUnwindSafe(|| hook(id))).is_err() {
                    warn!("eviction subscriber panicked for session {}", id);
                }
            }
        }
        for hook in self.on_periodic_cleanup.lock().iter() {
            let count = evicted_ids.len();
            if catch_unwind(AssertUnwindSafe(|| hook(count))).is_err() {
                warn!("periodic-cleanup subscriber panicked");
            }
        }

        evicted_ids.len()
    }

    /// Drop all registered subscribers, e.g. on shutdown.
    pub fn clear_subscribers(&self) {
        self.on_eviction.lock().clear();
        self.on_periodic_cleanup.lock().clear();
    }
}
