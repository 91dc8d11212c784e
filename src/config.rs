//! Engine configuration.
//!
//! Layers defaults with `CONFIG_*`/env var overrides using the `config`
//! crate's builder, the same env-with-fallback shape as any
//! `from_env`-style config constructor.

use crate::core::health::HealthThresholds;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_history_size: usize,
    pub max_branch_age_ms: u64,
    pub max_thought_length: usize,
    pub max_thoughts_per_branch: usize,
    pub cleanup_interval_ms: u64,
    pub rate_window_ms: u64,
    pub max_requests_per_window: u32,
    pub session_expiry_ms: u64,
    pub max_tracked_sessions: usize,
    pub max_nodes_per_tree: usize,

    pub max_storage_percent: f64,
    pub storage_degraded_percent: f64,
    pub max_response_time_ms: f64,
    pub response_time_degraded_ratio: f64,
    pub error_rate_degraded_percent: f64,
    pub error_rate_unhealthy_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_size: 100,
            max_branch_age_ms: 3_600_000,
            max_thought_length: 10_000,
            max_thoughts_per_branch: 1_000,
            cleanup_interval_ms: 60_000,
            rate_window_ms: 60_000,
            max_requests_per_window: 60,
            session_expiry_ms: 3_600_000,
            max_tracked_sessions: 10_000,
            max_nodes_per_tree: 500,

            max_storage_percent: 80.0,
            storage_degraded_percent: 64.0,
            max_response_time_ms: 200.0,
            response_time_degraded_ratio: 0.8,
            error_rate_degraded_percent: 2.0,
            error_rate_unhealthy_percent: 5.0,
        }
    }
}

impl EngineConfig {
    /// Layer defaults, then any `CONFIG_*`-prefixed environment overrides
    /// (e.g. `CONFIG_MAX_NODES_PER_TREE=1000`).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = EngineConfig::default();
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::Environment::with_prefix("CONFIG"));

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn max_branch_age(&self) -> Duration {
        Duration::from_millis(self.max_branch_age_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    pub fn session_expiry(&self) -> Duration {
        Duration::from_millis(self.session_expiry_ms)
    }

    pub fn health_thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            max_storage_percent: self.max_storage_percent,
            storage_degraded_percent: self.storage_degraded_percent,
            max_response_time_ms: self.max_response_time_ms,
            response_time_degraded_ratio: self.response_time_degraded_ratio,
            error_rate_degraded_percent: self.error_rate_degraded_percent,
            error_rate_unhealthy_percent: self.error_rate_unhealthy_percent,
        }
    }
}

impl serde::Serialize for EngineConfig {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("EngineConfig", 16)?;
        s.serialize_field("max_history_size", &self.max_history_size)?;
        s.serialize_field("max_branch_age_ms", &self.max_branch_age_ms)?;
        s.serialize_field("max_thought_length", &self.max_thought_length)?;
        s.serialize_field("max_thoughts_per_branch", &self.max_thoughts_per_branch)?;
        s.serialize_field("cleanup_interval_ms", &self.cleanup_interval_ms)?;
        s.serialize_field("rate_window_ms", &self.rate_window_ms)?;
        s.serialize_field("max_requests_per_window", &self.max_requests_per_window)?;
        s.serialize_field("session_expiry_ms", &self.session_expiry_ms)?;
        s.serialize_field("max_tracked_sessions", &self.max_tracked_sessions)?;
        s.serialize_field("max_nodes_per_tree", &self.max_nodes_per_tree)?;
        s.serialize_field("max_storage_percent", &self.max_storage_percent)?;
        s.serialize_field("storage_degraded_percent", &self.storage_degraded_percent)?;
        s.serialize_field("max_response_time_ms", &self.max_response_time_ms)?;
        s.serialize_field("response_time_degraded_ratio", &self.response_time_degraded_ratio)?;
        s.serialize_field("error_rate_degraded_percent", &self.error_rate_degraded_percent)?;
        s.serialize_field("error_rate_unhealthy_percent", &self.error_rate_unhealthy_percent)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_option_set() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history_size, 100);
        assert_eq!(config.max_nodes_per_tree, 500);
        assert_eq!(config.session_expiry_ms, 3_600_000);
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("CONFIG_MAX_NODES_PER_TREE", "42");
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.max_nodes_per_tree, 42);
        std::env::remove_var("CONFIG_MAX_NODES_PER_TREE");
    }
}
