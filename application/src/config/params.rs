//! Parameter objects controlling retrieval, validation, and orchestration.
//!
//! These group the tunable knobs so they are configurable rather than
//! hard-coded. The numeric defaults for the validation pass threshold and
//! the relaxed-retrieval confidence boost are empirically tuned, not
//! derived; treat them as starting points.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retrieval strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalParams {
    /// Vector search candidate pool size.
    pub top_k: usize,
    /// Result cap after post-filtering for similarity strategies.
    pub result_cap: usize,
    /// Page size for structured store queries.
    pub page_size: usize,
    /// Relevance multiplier applied to chunks recovered through filter
    /// relaxation or context expansion, clamped back into [0, 1].
    pub relaxed_confidence_boost: f64,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 50,
            result_cap: 25,
            page_size: 20,
            relaxed_confidence_boost: 1.2,
        }
    }
}

impl RetrievalParams {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_result_cap(mut self, cap: usize) -> Self {
        self.result_cap = cap;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_relaxed_confidence_boost(mut self, boost: f64) -> Self {
        self.relaxed_confidence_boost = boost;
        self
    }
}

/// Evidence validation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorParams {
    /// Minimum model-judged score (0..=10) for evidence to pass.
    pub pass_threshold: u8,
    /// Minimum mean relevance for similarity-sourced evidence.
    pub similarity_floor: f64,
    /// How many top passages the relevance judge sees.
    pub judge_top_n: usize,
}

impl Default for ValidatorParams {
    fn default() -> Self {
        Self {
            pass_threshold: 3,
            similarity_floor: 0.10,
            judge_top_n: 5,
        }
    }
}

impl ValidatorParams {
    pub fn with_pass_threshold(mut self, threshold: u8) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub fn with_similarity_floor(mut self, floor: f64) -> Self {
        self.similarity_floor = floor;
        self
    }

    pub fn with_judge_top_n(mut self, n: usize) -> Self {
        self.judge_top_n = n;
        self
    }
}

/// Orchestration loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorParams {
    /// Iteration cap for the iterative planner.
    pub max_iterations: usize,
    /// Accumulated-chunk cap for the iterative planner.
    pub max_total_chunks: usize,
    /// Chunks requested per retrieval batch.
    pub batch_size: usize,
    /// Concurrent sub-task cap for multi-topic runs.
    pub max_concurrent_subtasks: usize,
    /// Per-sub-task deadline.
    pub subtask_timeout: Option<Duration>,
    /// More candidate years than this without a year in the query asks
    /// the user instead of guessing.
    pub clarification_year_threshold: usize,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_total_chunks: 300,
            batch_size: 50,
            max_concurrent_subtasks: 3,
            subtask_timeout: Some(Duration::from_secs(120)),
            clarification_year_threshold: 3,
        }
    }
}

impl OrchestratorParams {
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_total_chunks(mut self, max: usize) -> Self {
        self.max_total_chunks = max;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_max_concurrent_subtasks(mut self, max: usize) -> Self {
        self.max_concurrent_subtasks = max;
        self
    }

    pub fn with_subtask_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.subtask_timeout = timeout;
        self
    }
}
