//! C10: orchestrates every other module into the single
//! `process_thought` entry point, plus the auxiliary
//! operations (`branch_from`, `set_cursor`, `evaluate`,
//! `read_tree`, `get_guidance`).

use crate::config::EngineConfig;
use crate::core::health::{check_health, HealthInputs, HealthReport};
use crate::core::mcts::{backpropagate, backtrack_suggestion, branching_suggestion, convergence_status};
use crate::core::metrics::{MetricsCollector, MetricsSnapshot};
use crate::core::mode::presets::get_preset;
use crate::core::mode::templates::{render_prompt, TemplateContext};
use crate::core::mode::{action, compressor, critique, phase, progress};
use crate::core::session_tracker::SessionTracker;
use crate::core::thought_store::BoundedThoughtStore;
use crate::core::tree::ThoughtTree;
use crate::core::types::{GuidanceResponse, NodeId, ThinkingMode, ThoughtInput};
use crate::core::validator;
use crate::error::{EngineError, ErrorCategory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct SessionState {
    tree: ThoughtTree,
    mode: ThinkingMode,
}

/// Top-level facade a server handler talks to. One instance serves every
/// session; per-session state lives in `sessions`, keyed by `session_id`.
pub struct Processor {
    config: EngineConfig,
    sessions: Mutex<HashMap<String, SessionState>>,
    store: BoundedThoughtStore,
    tracker: SessionTracker,
    metrics: MetricsCollector,
}

impl Processor {
    pub fn new(config: EngineConfig) -> Self {
        let store = BoundedThoughtStore::new(
            config.max_history_size,
            config.max_thoughts_per_branch,
            config.max_branch_age(),
        );
        let tracker = SessionTracker::new(config.max_tracked_sessions, config.session_expiry(), config.rate_window());

        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
            store,
            tracker,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn store(&self) -> &BoundedThoughtStore {
        &self.store
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Aggregate health rollup (C9): memory is approximated by total node
    /// count across every tracked session's tree against the global
    /// capacity ceiling (`max_tracked_sessions * max_nodes_per_tree`),
    /// since this engine keeps no other resident-memory accounting.
    pub fn health_report(&self) -> HealthReport {
        let total_nodes: u64 = self.sessions.lock().values().map(|s| s.tree.len() as u64).sum();
        let memory_limit = self.config.max_tracked_sessions as u64 * self.config.max_nodes_per_tree as u64;
        let snapshot = self.metrics.snapshot();

        let inputs = HealthInputs {
            memory_used_bytes: total_nodes,
            memory_limit_bytes: memory_limit,
            avg_response_time: Duration::from_secs_f64(snapshot.avg_response_time_ms / 1000.0),
            error_rate_percent: snapshot.error_rate_percent,
            storage_used: self.store.history_len() as u64,
            storage_capacity: self.config.max_history_size as u64,
            security_incidents_last_window: self.metrics.security_incidents_last_minute(),
        };
        check_health(&inputs, &self.config.health_thresholds())
    }

    /// Periodic sweep: drop expired sessions and stale branch buckets.
    /// Triggered by the tracker's own proactive cleanup and by the
    /// server's background timer.
    pub fn cleanup(&self) {
        self.tracker.cleanup();
        self.store.cleanup();
        // The tracker is the source of truth for liveness; a session whose
        // tracker entry expired (or was never recorded, e.g. a session
        // created only via `branch_from`/`set_cursor` with no rate-gated
        // thought yet) is dropped from the reasoning-tree map too, so no
        // unbounded per-session growth survives a sweep.
        self.sessions.lock().retain(|id, _| self.tracker.is_active(id));
    }

    /// Validate, rate-gate, install, backpropagate, then produce guidance.
    /// Every outcome (success or failure) is recorded against the request
    /// counters; `Security`-category failures also feed the health
    /// checker's security probe.
    pub fn process_thought(&self, input: ThoughtInput) -> Result<GuidanceResponse, EngineError> {
        let start = Instant::now();
        let result = self.process_thought_inner(input);
        match &result {
            Ok(_) => self.metrics.record_request(true, start.elapsed()),
            Err(err) => {
                self.metrics.record_request(false, start.elapsed());
                if err.category() == ErrorCategory::Security {
                    self.metrics.record_security_incident();
                }
            }
        }
        result
    }

    fn process_thought_inner(&self, input: ThoughtInput) -> Result<GuidanceResponse, EngineError> {
        let cleaned_text = validator::validate_text(&input.text, self.config.max_thought_length)?;

        // `check_and_record` both gates and records the request timestamp;
        // a separate `record_thought` call would double-count against the
        // rate window, since both share one per-session timestamp list.
        if !self.tracker.check_and_record(&input.session_id, self.config.max_requests_per_window) {
            return Err(EngineError::rate_limit(self.config.rate_window_ms / 1000));
        }

        let mut input = input;
        input.text = cleaned_text;

        let mode = input.mode.unwrap_or_default();

        let mut sessions = self.sessions.lock();
        let session = sessions.entry(input.session_id.clone()).or_insert_with(|| SessionState {
            tree: ThoughtTree::new(self.config.max_nodes_per_tree),
            mode,
        });
        session.mode = mode;

        self.store.add_thought(&input);
        let node_id = session.tree.add_thought(&input)?;
        self.metrics.record_thought(input.text.len(), input.is_revision, input.branch_from_thought.is_some());

        let preset = get_preset(mode);
        match input.evaluation_score {
            Some(score) => backpropagate(&mut session.tree, node_id, score),
            None if preset.auto_evaluate => {
                if let Some(auto_score) = preset.auto_eval_value {
                    backpropagate(&mut session.tree, node_id, auto_score);
                }
            }
            None => {}
        }

        let response = self.build_guidance(&mut session.tree, node_id, input.thought_number, mode);
        Ok(response)
    }

    pub fn branch_from(&self, session_id: &str, from_thought: u32, input: ThoughtInput) -> Result<GuidanceResponse, EngineError> {
        let mut input = input;
        input.branch_from_thought = Some(from_thought);
        input.session_id = session_id.to_string();
        self.process_thought(input)
    }

    pub fn set_cursor(&self, session_id: &str, node_id: NodeId) -> Result<(), EngineError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::state(format!("unknown session {session_id}")))?;
        session.tree.set_cursor(node_id)
    }

    pub fn evaluate(&self, session_id: &str, node_id: NodeId, value: f64) -> Result<GuidanceResponse, EngineError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::state(format!("unknown session {session_id}")))?;
        backpropagate(&mut session.tree, node_id, value);
        let thought_number = session.tree.get(node_id).map(|n| n.thought_number).unwrap_or(0);
        let mode = session.mode;
        Ok(self.build_guidance(&mut session.tree, node_id, thought_number, mode))
    }

    pub fn read_tree(&self, session_id: &str) -> Result<Vec<crate::core::types::TreeNode>, EngineError> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| EngineError::state(format!("unknown session {session_id}")))?;
        Ok(session.tree.all_nodes().into_iter().cloned().collect())
    }

    pub fn get_guidance(&self, session_id: &str, mode: ThinkingMode) -> Result<GuidanceResponse, EngineError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::state(format!("unknown session {session_id}")))?;
        session.mode = mode;
        let cursor = session
            .tree
            .cursor()
            .ok_or_else(|| EngineError::state("session has no thoughts yet"))?;
        let thought_number = session.tree.get(cursor).map(|n| n.thought_number).unwrap_or(0);
        Ok(self.build_guidance(&mut session.tree, cursor, thought_number, mode))
    }

    fn build_guidance(&self, tree: &mut ThoughtTree, cursor: NodeId, thought_number: u32, mode: ThinkingMode) -> GuidanceResponse {
        let preset = get_preset(mode);
        let convergence = convergence_status(tree, &preset);
        let act = action::choose_action(tree, cursor, thought_number, convergence.as_ref(), &preset);
        let ph = phase::detect_phase(tree, cursor, convergence.as_ref(), &preset);

        let branching = branching_suggestion(tree, cursor, thought_number, &preset);
        let backtracking = if preset.enable_backtracking {
            backtrack_suggestion(tree, cursor, &preset)
        } else {
            None
        };

        let ctx = TemplateContext {
            thought_number,
            target_depth_max: preset.target_depth_max,
            cursor_node_id: cursor,
            branch_from_node_id: branching.as_ref().map(|b| b.from_node_id),
            backtrack_to_node_id: backtracking.as_ref().map(|b| b.to_node_id),
            convergence_score: convergence.as_ref().map(|c| c.score).unwrap_or(0.0),
            convergence_threshold: preset.convergence_threshold,
        };
        let prompt = render_prompt(mode, act, &ctx);
        let prompt = compressor::compress(&prompt, preset.max_thought_display_length.max(prompt.len()));
        let prompt = validator::sanitize(&prompt);

        let overview = progress::progress_overview(tree, tree.len(), preset.progress_overview_interval);
        let crit = critique::critique(tree, preset.enable_critique);

        GuidanceResponse {
            action: act,
            phase: ph,
            target_total_thoughts: preset.target_depth_max,
            thought_prompt: prompt,
            progress_overview: overview,
            critique: crit,
            convergence_status: convergence,
            branching_suggestion: branching,
            backtrack_suggestion: backtracking,
        }
    }
}
