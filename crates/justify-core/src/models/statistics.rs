use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters collected while building a hitting-set tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Tree nodes created, root included
    pub nodes: usize,
    /// Single-justification searches run (root included)
    pub find_one_calls: usize,
    /// Branches answered by an already-found justification
    pub reused_justifications: usize,
    pub closed_paths: usize,
    /// Branches skipped by closed-path or explored-path pruning
    pub early_terminated_paths: usize,
    pub closed_path_min_length: Option<usize>,
    pub closed_path_max_length: usize,
    pub explored_path_max_length: usize,
    pub oracle_calls: u64,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            nodes: 0,
            find_one_calls: 0,
            reused_justifications: 0,
            closed_paths: 0,
            early_terminated_paths: 0,
            closed_path_min_length: None,
            closed_path_max_length: 0,
            explored_path_max_length: 0,
            oracle_calls: 0,
        }
    }

    pub fn record_closed_path(&mut self, length: usize) {
        self.closed_paths += 1;
        self.closed_path_max_length = self.closed_path_max_length.max(length);
        self.closed_path_min_length = Some(match self.closed_path_min_length {
            Some(min) => min.min(length),
            None => length,
        });
    }

    pub fn record_explored_path(&mut self, length: usize) {
        self.explored_path_max_length = self.explored_path_max_length.max(length);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
