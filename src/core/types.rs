//! Data model shared across the engine.

use serde::{Deserialize, Serialize};

/// A unique identifier for a tree node. Opaque to callers; stable within
/// one tree's lifetime.
pub type NodeId = u64;

/// The thinking-mode preset a session is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingMode {
    Fast,
    Expert,
    Deep,
}

impl Default for ThinkingMode {
    fn default() -> Self {
        ThinkingMode::Expert
    }
}

/// Immutable, caller-submitted thought, after validation and sanitisation.
///
/// Mirrors the original sequential-thinking request shape: a text payload
/// plus structural hints (thought_number, branching origin, evaluation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtInput {
    pub text: String,
    pub thought_number: u32,
    pub total_thoughts: u32,
    pub next_thought_needed: bool,
    pub session_id: String,

    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub branch_from_thought: Option<u32>,
    #[serde(default)]
    pub is_revision: bool,
    #[serde(default)]
    pub revises_thought: Option<u32>,
    #[serde(default)]
    pub evaluation_score: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub mode: Option<ThinkingMode>,
}

/// A node owned by a [`crate::core::tree::ThoughtTree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub thought_number: u32,
    pub text: String,
    pub visit_count: u32,
    pub total_value: f64,
}

impl TreeNode {
    /// (T3) Mean value is only meaningful once the node has been visited.
    pub fn mean_value(&self) -> Option<f64> {
        if self.visit_count > 0 {
            Some(self.total_value / self.visit_count as f64)
        } else {
            None
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.visit_count > 0
    }
}

/// Action the mode engine recommends for the next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Continue,
    Branch,
    Backtrack,
    Evaluate,
    Conclude,
}

/// Reasoning phase, independent of the chosen action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Exploring,
    Evaluating,
    Converging,
    Concluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceStatus {
    pub is_converged: bool,
    pub score: f64,
    pub min_evaluations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchingSuggestion {
    pub from_node_id: NodeId,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackSuggestion {
    pub to_node_id: NodeId,
    pub rationale: String,
}

/// The guidance response shape returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceResponse {
    pub action: Action,
    pub phase: Phase,
    pub target_total_thoughts: u32,
    pub thought_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence_status: Option<ConvergenceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branching_suggestion: Option<BranchingSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtrack_suggestion: Option<BacktrackSuggestion>,
}
