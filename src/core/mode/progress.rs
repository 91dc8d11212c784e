//! Progress overview — a one-shot status summary emitted every
//! `progress_overview_interval` nodes.

use crate::core::tree::ThoughtTree;

pub fn progress_overview(tree: &ThoughtTree, node_count: usize, interval: u32) -> Option<String> {
    if interval == 0 || node_count % interval as usize != 0 {
        return None;
    }

    let depth = tree.max_depth();
    let evaluated = tree.all_nodes().iter().filter(|n| n.is_evaluated()).count();
    let gaps = tree
        .all_nodes()
        .iter()
        .filter(|n| n.children.is_empty() && !n.is_evaluated())
        .count();

    let best_path = tree.best_path();
    let best_score = best_path
        .last()
        .and_then(|id| tree.get(*id))
        .and_then(|n| n.mean_value())
        .unwrap_or(0.0);

    Some(format!(
        "{node_count} thoughts, depth {depth}, {evaluated} evaluated, {gaps} unresolved gaps. Best path — score {best_score:.2}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ThoughtInput;

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
    fn null_outside_interval() {
        let mut tree = ThoughtTree::new(10);
        tree.add_thought(&thought(1)).unwrap();
        assert!(progress_overview(&tree, 1, 3).is_none());
    }

    #[test]
    fn present_when_count_divides_interval() {
        let mut tree = ThoughtTree::new(10);
        for i in 1..=6 {
            tree.add_thought(&thought(i)).unwrap();
        }
        let overview = progress_overview(&tree, 6, 3).unwrap();
        assert!(overview.contains("6 thoughts"));
        assert!(overview.contains("Best path"));
    }
}
