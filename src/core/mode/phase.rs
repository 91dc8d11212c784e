//! Phase detector — independent of the action chooser.

use crate::core::mode::presets::ModePreset;
use crate::core::tree::ThoughtTree;
use crate::core::types::{ConvergenceStatus, NodeId, Phase};

pub fn detect_phase(
    tree: &ThoughtTree,
    cursor: NodeId,
    convergence: Option<&ConvergenceStatus>,
    preset: &ModePreset,
) -> Phase {
    if let Some(status) = convergence {
        if status.is_converged {
            return Phase::Concluded;
        }
    }

    let evaluation_count = tree
        .all_nodes()
        .iter()
        .filter(|n| n.is_evaluated())
        .count() as u32;

    if evaluation_count >= preset.min_evaluations_before_converge && preset.min_evaluations_before_converge > 0 {
        return Phase::Converging;
    }

    let depth = tree.depth(cursor).unwrap_or(0);
    let any_evaluated = evaluation_count > 0;
    if any_evaluated
        && depth >= preset.target_depth_min as usize
        && evaluation_count < preset.min_evaluations_before_converge
    {
        return Phase::Evaluating;
    }

    // Mirrors `action::choose_action`'s own depth-cap rule: modes whose
    // preset never converges (e.g. Fast, `min_evaluations_before_converge
    // == 0`) still conclude once the cursor reaches the target depth.
    if depth >= preset.target_depth_max as usize {
        return Phase::Concluded;
    }

    Phase::Exploring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mcts::backpropagate;
    use crate::core::mode::presets::get_preset;
    use crate::core::types::{ThinkingMode, ThoughtInput};

    fn thought(n: u32) -> ThoughtInput {
        ThoughtInput {
            text: format!("t{n}"),
            thought_number: n,
            total_thoughts: n,
            next_thought_needed: true,
            session_id: "s".into(),
            branch_id: None,
            branch_from_thought: None,
            is_revision: false,
            revises_thought: None,
            evaluation_score: None,
            tags: Vec::new(),
            confidence: None,
            mode: None,
        }
    }

    #[test]
    fn default_phase_is_exploring() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        assert_eq!(detect_phase(&tree, root, None, &preset), Phase::Exploring);
    }

    #[test]
    fn concluded_when_converged() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let status = ConvergenceStatus {
            is_converged: true,
            score: 0.9,
            min_evaluations: 3,
        };
        assert_eq!(detect_phase(&tree, root, Some(&status), &preset), Phase::Concluded);
    }

    #[test]
    fn concluded_at_depth_cap_even_without_convergence() {
        let preset = get_preset(ThinkingMode::Fast);
        let mut tree = ThoughtTree::new(10);
        let mut last = tree.add_thought(&thought(1)).unwrap();
        for n in 2..=6 {
            last = tree.add_thought(&thought(n)).unwrap();
        }
        assert_eq!(detect_phase(&tree, last, None, &preset), Phase::Concluded);
    }

    #[test]
    fn converging_once_evaluation_count_meets_floor() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        for _ in 0..3 {
            backpropagate(&mut tree, root, 0.5);
        }
        let status = ConvergenceStatus {
            is_converged: false,
            score: 0.5,
            min_evaluations: 3,
        };
        assert_eq!(detect_phase(&tree, root, Some(&status), &preset), Phase::Converging);
    }
}
