//! C5: UCB1 selection, backpropagation, branching/backtracking heuristics,
//! and convergence detection over a [`ThoughtTree`].

use super::mode::presets::ModePreset;
use super::tree::ThoughtTree;
use super::types::{BacktrackSuggestion, BranchingSuggestion, ConvergenceStatus, NodeId};

/// UCB1 score for a child given its parent's total visit count. Unvisited
/// children always win (treated as +∞) so every child is tried once before
/// exploitation kicks in.
pub fn ucb1_score(child_mean: Option<f64>, child_visits: u32, parent_visits: u32, exploration_constant: f64) -> f64 {
    match child_mean {
        None => f64::INFINITY,
        Some(mean) => {
            let parent_visits = parent_visits.max(1) as f64;
            mean + exploration_constant * ((parent_visits.ln()) / child_visits as f64).sqrt()
        }
    }
}

/// Picks the child of `node_id` with the highest UCB1 score. Ties favor the
/// higher mean, then insertion order (first child in the children list).
pub fn select_child(tree: &ThoughtTree, node_id: NodeId, exploration_constant: f64) -> Option<NodeId> {
    let node = tree.get(node_id)?;
    let parent_visits = node.visit_count;

    let mut best: Option<(NodeId, f64, f64)> = None;
    for &child_id in &node.children {
        let child = tree.get(child_id)?;
        let score = ucb1_score(child.mean_value(), child.visit_count, parent_visits, exploration_constant);
        let mean = child.mean_value().unwrap_or(f64::INFINITY);
        let better = match best {
            None => true,
            Some((_, best_score, best_mean)) => {
                if score != best_score {
                    score > best_score
                } else {
                    mean > best_mean
                }
            }
        };
        if better {
            best = Some((child_id, score, mean));
        }
    }
    best.map(|(id, _, _)| id)
}

/// Walk from `leaf_id` to the root, incrementing `visit_count` and adding
/// the (clamped) value at every step.
pub fn backpropagate(tree: &mut ThoughtTree, leaf_id: NodeId, value: f64) {
    let value = value.clamp(0.0, 1.0);
    let mut current = Some(leaf_id);
    while let Some(node_id) = current {
        let parent_id = {
            let Some(node) = tree.node_mut(node_id) else {
                break;
            };
            node.visit_count += 1;
            node.total_value += value;
            node.parent_id
        };
        current = parent_id;
    }
}

/// Should the cursor branch on this turn?
///
/// "Visited" here means the cursor is a real, already-submitted thought
/// (every cursor qualifies by construction) rather than an MCTS visit
/// count from backpropagation — a chain of plain thoughts with no
/// `evaluate` calls should still be able to branch.
pub fn should_branch(tree: &ThoughtTree, cursor: NodeId, _thought_number: u32, preset: &ModePreset) -> bool {
    let Some(node) = tree.get(cursor) else {
        return false;
    };
    if node.children.len() >= preset.max_branching_factor as usize {
        return false;
    }

    let depth = tree.depth(cursor).unwrap_or(0);
    match preset.suggest_strategy {
        super::mode::presets::SuggestStrategy::Exploit => false,
        super::mode::presets::SuggestStrategy::Balanced => {
            depth > 0 && depth % 2 == 0 && depth < preset.target_depth_min as usize
        }
        super::mode::presets::SuggestStrategy::Explore => true,
    }
}

pub fn branching_suggestion(
    tree: &ThoughtTree,
    cursor: NodeId,
    thought_number: u32,
    preset: &ModePreset,
) -> Option<BranchingSuggestion> {
    if should_branch(tree, cursor, thought_number, preset) {
        Some(BranchingSuggestion {
            from_node_id: cursor,
            rationale: "branching to explore an alternative continuation from this point".to_string(),
        })
    } else {
        None
    }
}

/// Suggest backtracking to a higher-mean sibling when the cursor's own mean
/// has dropped below the mode's threshold.
pub fn backtrack_suggestion(tree: &ThoughtTree, cursor: NodeId, preset: &ModePreset) -> Option<BacktrackSuggestion> {
    if !preset.enable_backtracking {
        return None;
    }
    let node = tree.get(cursor)?;
    let mean = node.mean_value()?;

    let (threshold, min_visits) = match preset.suggest_strategy {
        super::mode::presets::SuggestStrategy::Balanced => (0.35, 0),
        super::mode::presets::SuggestStrategy::Explore => (0.5, 2),
        super::mode::presets::SuggestStrategy::Exploit => return None,
    };
    if mean >= threshold || node.visit_count < min_visits {
        return None;
    }

    let parent_id = node.parent_id?;
    let parent = tree.get(parent_id)?;

    let mut best_sibling: Option<(NodeId, f64)> = None;
    for &sibling_id in &parent.children {
        if sibling_id == cursor {
            continue;
        }
        let Some(sibling) = tree.get(sibling_id) else {
            continue;
        };
        let sibling_mean = sibling.mean_value().unwrap_or(f64::INFINITY);
        let better = match best_sibling {
            None => true,
            Some((_, best_mean)) => sibling_mean > best_mean,
        };
        if better {
            best_sibling = Some((sibling_id, sibling_mean));
        }
    }

    // "an unexplored sibling" includes room the parent still has for a
    // branch that hasn't been created yet, not just an existing one — when
    // no sibling exists at all but the parent could still branch, back up
    // to the parent itself rather than reporting nothing.
    let has_room_for_unexplored_sibling = parent.children.len() < preset.max_branching_factor as usize;
    if best_sibling.is_none() && !has_room_for_unexplored_sibling {
        return None;
    }

    let (target, rationale) = match best_sibling {
        Some((sibling, _)) => (
            sibling,
            format!("mean value {mean:.2} is below the backtrack threshold; a sibling looks more promising"),
        ),
        None => (
            parent_id,
            format!("mean value {mean:.2} is below the backtrack threshold; backing up to branch again from the parent"),
        ),
    };

    Some(BacktrackSuggestion { to_node_id: target, rationale })
}

/// `m` = minimum evaluation count across best-path leaves,
/// `s` = mean value of the last node on the best path.
pub fn convergence_status(tree: &ThoughtTree, preset: &ModePreset) -> Option<ConvergenceStatus> {
    if preset.min_evaluations_before_converge == 0 {
        return None;
    }

    let path = tree.best_path();
    let last_id = *path.last()?;
    let last = tree.get(last_id)?;
    let s = last.mean_value().unwrap_or(0.0);

    let m = path
        .iter()
        .filter_map(|id| tree.get(*id))
        .filter(|n| n.is_evaluated() && n.children.is_empty())
        .map(|n| n.visit_count)
        .min()
        .unwrap_or(0);

    let is_converged = m >= preset.min_evaluations_before_converge && s >= preset.convergence_threshold;

    Some(ConvergenceStatus {
        is_converged,
        score: s,
        min_evaluations: m,
    })
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
    fn unvisited_child_always_wins_selection() {
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let visited = tree.add_thought(&thought(2)).unwrap();
        tree.set_cursor(root).unwrap();
        let unvisited = tree.add_thought(&thought(3)).unwrap();

        backpropagate(&mut tree, visited, 0.9);
        let selected = select_child(&tree, root, 1.41).unwrap();
        assert_eq!(selected, unvisited);
    }

    #[test]
    fn backpropagate_updates_every_ancestor() {
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let child = tree.add_thought(&thought(2)).unwrap();
        backpropagate(&mut tree, child, 0.8);
        assert_eq!(tree.get(root).unwrap().visit_count, 1);
        assert_eq!(tree.get(child).unwrap().visit_count, 1);
        assert!((tree.get(child).unwrap().total_value - 0.8).abs() < 1e-9);
    }

    #[test]
    fn backpropagate_clamps_value_to_unit_range() {
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        backpropagate(&mut tree, root, 5.0);
        assert!((tree.get(root).unwrap().total_value - 1.0).abs() < 1e-9);
        backpropagate(&mut tree, root, -5.0);
        assert!((tree.get(root).unwrap().total_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fast_mode_never_branches() {
        let preset = get_preset(ThinkingMode::Fast);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        backpropagate(&mut tree, root, 0.9);
        assert!(branching_suggestion(&tree, root, 2, &preset).is_none());
    }

    #[test]
    fn expert_backtrack_suggests_highest_mean_sibling() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let low = tree.add_thought(&thought(2)).unwrap();
        tree.set_cursor(root).unwrap();
        let high = tree.add_thought(&thought(3)).unwrap();

        backpropagate(&mut tree, low, 0.1);
        backpropagate(&mut tree, high, 0.9);

        let suggestion = backtrack_suggestion(&tree, low, &preset).unwrap();
        assert_eq!(suggestion.to_node_id, high);
    }

    #[test]
    fn expert_branches_at_even_depth_without_any_evaluation() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        tree.add_thought(&thought(1)).unwrap();
        tree.add_thought(&thought(2)).unwrap();
        let third = tree.add_thought(&thought(3)).unwrap();

        // No backpropagation at all: a plain chain of submitted thoughts
        // can still trigger a branch suggestion at an even depth.
        let suggestion = branching_suggestion(&tree, third, 3, &preset).unwrap();
        assert_eq!(suggestion.from_node_id, third);
    }

    #[test]
    fn backtrack_backs_up_to_parent_when_no_sibling_exists_yet() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let child = tree.add_thought(&thought(2)).unwrap();
        let leaf = tree.add_thought(&thought(3)).unwrap();
        backpropagate(&mut tree, leaf, 0.2);

        let suggestion = backtrack_suggestion(&tree, leaf, &preset).unwrap();
        assert_eq!(suggestion.to_node_id, child);
        let _ = root;
    }

    #[test]
    fn deep_mode_requires_two_visits_before_backtracking() {
        let preset = get_preset(ThinkingMode::Deep);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        let low = tree.add_thought(&thought(2)).unwrap();
        tree.set_cursor(root).unwrap();
        let _high = tree.add_thought(&thought(3)).unwrap();

        backpropagate(&mut tree, low, 0.2);
        assert!(backtrack_suggestion(&tree, low, &preset).is_none());
        backpropagate(&mut tree, low, 0.2);
        assert!(backtrack_suggestion(&tree, low, &preset).is_some());
    }

    #[test]
    fn convergence_is_null_when_mode_requires_zero_evaluations() {
        let preset = get_preset(ThinkingMode::Fast);
        let mut tree = ThoughtTree::new(10);
        tree.add_thought(&thought(1)).unwrap();
        assert!(convergence_status(&tree, &preset).is_none());
    }

    #[test]
    fn convergence_requires_minimum_evaluations_and_score() {
        let preset = get_preset(ThinkingMode::Expert);
        let mut tree = ThoughtTree::new(10);
        let root = tree.add_thought(&thought(1)).unwrap();
        for _ in 0..3 {
            backpropagate(&mut tree, root, 0.9);
        }
        let status = convergence_status(&tree, &preset).unwrap();
        assert!(status.is_converged);
        assert_eq!(status.min_evaluations, 3);
    }
}
