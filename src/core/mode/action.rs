//! Action chooser — ordered, first-match-wins rule list.

use crate::core::mcts::{backtrack_suggestion, branching_suggestion};
use crate::core::mode::presets::ModePreset;
use crate::core::tree::ThoughtTree;
use crate::core::types::{Action, ConvergenceStatus, NodeId};

pub fn choose_action(
    tree: &ThoughtTree,
    cursor: NodeId,
    thought_number: u32,
    convergence: Option<&ConvergenceStatus>,
    preset: &ModePreset,
) -> Action {
    if let Some(status) = convergence {
        if status.is_converged {
            return Action::Conclude;
        }
    }

    if preset.enable_backtracking && backtrack_suggestion(tree, cursor, preset).is_some() {
        return Action::Backtrack;
    }

    let Some(node) = tree.get(cursor) else {
        return Action::Continue;
    };

    if branching_suggestion(tree, cursor, thought_number, preset).is_some()
        && (node.children.len() as u32) < preset.max_branching_factor
    {
        return Action::Branch;
    }

    if node.children.len() as u32 >= preset.max_branching_factor
        && node.children.iter().any(|id| {
            tree.get(*id).map(|c| !c.is_evaluated()).unwrap_or(false)
        })
    {
        return Action::Evaluate;
    }

    if tree.depth(cursor).unwrap_or(0) >= preset.target_depth_max as usize {
        return Action::Conclude;
    }

    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn converged_status_forces_conclude() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let status = ConvergenceStatus {
            is_converged: true,
            score: 0.9,
            min_evaluations: 3,
        };
        assert_eq!(choose_action(&tree, root, 1, Some(&status), &preset), Action::Conclude);
    }

    #[test]
    fn depth_at_max_without_convergence_concludes() {
        let preset = get_preset(ThinkingMode::Fast);
        let mut tree = ThoughtTree::new(20);
        let mut last = tree.add_thought(&thought(1)).unwrap();
        for n in 2..=6 {
            last = tree.add_thought(&thought(n)).unwrap();
        }
        assert_eq!(choose_action(&tree, last, 6, None, &preset), Action::Conclude);
    }

    #[test]
    fn default_action_is_continue() {
        let preset = get_preset(ThinkingMode::Fast);
        let mut tree = ThoughtTree::new(20);
        let root = tree.add_thought(&thought(1)).unwrap();
        assert_eq!(choose_action(&tree, root, 1, None, &preset), Action::Continue);
    }
}
