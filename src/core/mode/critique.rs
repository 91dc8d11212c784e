//! Critique — a best-path quality summary, gated on `enable_critique` and a
//! minimum path length.

use crate::core::tree::ThoughtTree;

pub fn critique(tree: &ThoughtTree, enable_critique: bool) -> Option<String> {
    if !enable_critique {
        return None;
    }
    let best_path = tree.best_path();
    if best_path.len() < 2 {
        return None;
    }

    let weakest = best_path
        .iter()
        .filter_map(|id| tree.get(*id))
        .filter(|n| n.is_evaluated())
        .min_by(|a, b| a.mean_value().partial_cmp(&b.mean_value()).unwrap())
        .map(|n| format!("node {} (mean {:.2})", n.node_id, n.mean_value().unwrap()))
        .unwrap_or_else(|| "N/A".to_string());

    let interior = &best_path[..best_path.len() - 1];
    let unchallenged = interior
        .iter()
        .filter_map(|id| tree.get(*id))
        .filter(|n| n.children.len() == 1)
        .count();
    let interior_count = interior.len();

    let all_nodes_count = tree.all_nodes().len().max(1);
    let coverage = (best_path.len() as f64 / all_nodes_count as f64) * 100.0;
    let balance = if coverage > 66.0 { "one-sided" } else { "balanced" };

    Some(format!(
        "Weakest step: {weakest}. Unchallenged steps: {unchallenged}/{interior_count}. Branch coverage: {coverage:.0}% ({balance})."
    ))
}
