//! C4: the parent/child graph of thought nodes, with a cursor and path
//! queries.
//!
//! Nodes live in a dense arena keyed by an opaque integer id rather than
//! through parent/child pointers.

use super::types::{NodeId, ThoughtInput, TreeNode};
use crate::error::EngineError;
use std::collections::HashMap;

pub struct ThoughtTree {
    nodes: HashMap<NodeId, TreeNode>,
    root: Option<NodeId>,
    cursor: Option<NodeId>,
    max_nodes: usize,
    next_id: NodeId,
    /// Last node installed for a given `thought_number`, so
    /// `branch_from_thought` (expressed in thought numbers, not node ids)
    /// can resolve to a concrete node.
    thought_number_index: HashMap<u32, NodeId>,
}

impl ThoughtTree {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            root: None,
            cursor: None,
            max_nodes,
            next_id: 0,
            thought_number_index: HashMap::new(),
        }
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    pub fn get(&self, node_id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Install `input` as a child of the cursor (or as the root, for the
    /// first thought) and advance the cursor to it. If
    /// `branch_from_thought` is set, the cursor is first moved to the
    /// referenced node. Fails with `RESOURCE_EXHAUSTED` if installing would
    /// push the node count beyond `max_nodes`.
    pub fn add_thought(&mut self, input: &ThoughtInput) -> Result<NodeId, EngineError> {
        if let Some(ref_number) = input.branch_from_thought {
            let target = *self.thought_number_index.get(&ref_number).ok_or_else(|| {
                EngineError::state(format!(
                    "branch_from_thought references unknown thought_number {ref_number}"
                ))
            })?;
            self.cursor = Some(target);
        }

        if self.nodes.len() + 1 > self.max_nodes {
            return Err(EngineError::resource_exhausted(format!(
                "tree would exceed max_nodes ({})",
                self.max_nodes
            )));
        }

        let node_id = self.next_id;
        self.next_id += 1;

        let parent_id = self.cursor;
        let node = TreeNode {
            node_id,
            parent_id,
            children: Vec::new(),
            thought_number: input.thought_number,
            text: input.text.clone(),
            visit_count: 0,
            total_value: 0.0,
        };

        if self.root.is_none() {
            self.root = Some(node_id);
        }
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.push(node_id);
            }
        }

        self.nodes.insert(node_id, node);
        self.thought_number_index.insert(input.thought_number, node_id);
        self.cursor = Some(node_id);

        Ok(node_id)
    }

    pub fn set_cursor(&mut self, node_id: NodeId) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(EngineError::state(format!("unknown node_id {node_id}")));
        }
        self.cursor = Some(node_id);
        Ok(())
    }

    pub fn leaf_nodes(&self) -> Vec<&TreeNode> {
        self.nodes.values().filter(|n| n.children.is_empty()).collect()
    }

    pub fn all_nodes(&self) -> Vec<&TreeNode> {
        self.nodes.values().collect()
    }

    pub fn depth(&self, node_id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.nodes.get(&node_id)?;
        while let Some(parent_id) = current.parent_id {
            depth += 1;
            current = self.nodes.get(&parent_id)?;
        }
        Some(depth)
    }

    pub fn max_depth(&self) -> usize {
        self.nodes
            .keys()
            .filter_map(|id| self.depth(*id))
            .max()
            .unwrap_or(0)
    }

    /// Greedy root-to-leaf walk, at each step following the child with the
    /// highest mean value (tie-break: highest visit_count, then insertion
    /// order — the first child in the ordered children list wins ties
    /// since we only replace the running best on a strict improvement).
    pub fn best_path(&self) -> Vec<NodeId> {
        let mut path = Vec::new();
        let Some(mut current) = self.root else {
            return path;
        };
        path.push(current);

        loop {
            let node = match self.nodes.get(&current) {
                Some(n) => n,
                None => break,
            };
            if node.children.is_empty() {
                break;
            }

            let mut best: Option<&TreeNode> = None;
            for child_id in &node.children {
                let Some(child) = self.nodes.get(child_id) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some(current_best) => {
                        let child_mean = child.mean_value().unwrap_or(0.0);
                        let best_mean = current_best.mean_value().unwrap_or(0.0);
                        if child_mean != best_mean {
                            child_mean > best_mean
                        } else {
                            child.visit_count > current_best.visit_count
                        }
                    }
                };
                if better {
                    best = Some(child);
                }
            }

            match best {
                Some(next) => {
                    current = next.node_id;
                    path.push(current);
                }
                None => break,
            }
        }

        path
    }
}
