//! C3: bounded thought store — global history (via the ring buffer) plus
//! per-branch expiring buckets.

use super::ring_buffer::RingBuffer;
use super::types::ThoughtInput;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct BranchBucket {
    thoughts: Vec<ThoughtInput>,
    last_accessed: Instant,
}

pub struct BoundedThoughtStore {
    history: Mutex<RingBuffer<ThoughtInput>>,
    branches: Mutex<HashMap<String, BranchBucket>>,
    max_thoughts_per_branch: usize,
    max_branch_age: Duration,
}

impl BoundedThoughtStore {
    pub fn new(max_history_size: usize, max_thoughts_per_branch: usize, max_branch_age: Duration) -> Self {
        Self {
            history: Mutex::new(RingBuffer::new(max_history_size)),
            branches: Mutex::new(HashMap::new()),
            max_thoughts_per_branch,
            max_branch_age,
        }
    }

    /// Copies the record into the store — callers' data is never mutated
    /// by the store (T4). Well-formed input never fails here; oversize
    /// text is rejected earlier by the validator.
    pub fn add_thought(&self, thought: &ThoughtInput) {
        self.history.lock().add(thought.clone());

        if let Some(branch_id) = &thought.branch_id {
            let mut branches = self.branches.lock();
            let now = Instant::now();
            let bucket = branches.entry(branch_id.clone()).or_insert_with(|| BranchBucket {
                thoughts: Vec::new(),
                last_accessed: now,
            });
            bucket.thoughts.push(thought.clone());
            bucket.last_accessed = now;
            if bucket.thoughts.len() > self.max_thoughts_per_branch {
                let overflow = bucket.thoughts.len() - self.max_thoughts_per_branch;
                bucket.thoughts.drain(0..overflow);
            }
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().current_size()
    }

    pub fn recent_history(&self, limit: Option<usize>) -> Vec<ThoughtInput> {
        self.history.lock().get_all(limit).into_iter().cloned().collect()
    }

    pub fn branch_thoughts(&self, branch_id: &str) -> Vec<ThoughtInput> {
        self.branches
            .lock()
            .get(branch_id)
            .map(|b| b.thoughts.clone())
            .unwrap_or_default()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.lock().len()
    }

    /// Drop buckets older than `max_branch_age`. Triggered by the session
    /// tracker's periodic sweep.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.branches
            .lock()
            .retain(|_, bucket| now.duration_since(bucket.last_accessed) <= self.max_branch_age);
    }

    pub fn clear(&self) {
        self.history.lock().clear();
        self.branches.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thought(n: u32, branch: Option<&str>) -> ThoughtInput {
        ThoughtInput {
            text: format!("thought {n}"),
            thought_number: n,
            total_thoughts: n,
            next_thought_needed: true,
            session_id: "s1".to_string(),
            branch_id: branch.map(|b| b.to_string()),
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
    fn add_thought_copies_and_appends_to_history() {
        let store = BoundedThoughtStore::new(100, 10, Duration::from_secs(3600));
        let t = thought(1, None);
        store.add_thought(&t);
        assert_eq!(store.history_len(), 1);
        assert_eq!(store.recent_history(None)[0].text, "thought 1");
    }

    #[test]
    fn history_evicts_oldest_beyond_max_history_size() {
        let store = BoundedThoughtStore::new(3, 10, Duration::from_secs(3600));
        for i in 0..5 {
            store.add_thought(&thought(i, None));
        }
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn branch_bucket_trims_to_max_thoughts_per_branch() {
        let store = BoundedThoughtStore::new(100, 2, Duration::from_secs(3600));
        for i in 0..5 {
            store.add_thought(&thought(i, Some("b1")));
        }
        let bucket = store.branch_thoughts("b1");
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].thought_number, 3);
        assert_eq!(bucket[1].thought_number, 4);
    }

    #[test]
    fn cleanup_drops_stale_branches() {
        let store = BoundedThoughtStore::new(100, 10, Duration::from_millis(0));
        store.add_thought(&thought(1, Some("b1")));
        std::thread::sleep(Duration::from_millis(5));
        store.cleanup();
        assert_eq!(store.branch_count(), 0);
    }
}
