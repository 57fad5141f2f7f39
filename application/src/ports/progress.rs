//! Progress notification port
//!
//! Defines the interface for reporting progress during a query run.

use finsight_domain::{RunStage, StrategyKind};

/// Callback for progress updates during a query run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console spinner, plain log lines, etc.)
pub trait RunProgress: Send + Sync {
    /// Called when the run enters a stage
    fn on_stage(&self, stage: RunStage) {
        let _ = stage;
    }

    /// Called for each retrieval attempt within a run
    fn on_strategy_attempt(&self, strategy: StrategyKind, attempt: usize) {
        let _ = (strategy, attempt);
    }

    /// Called when a sub-task of a multi-topic run finishes
    fn on_subtask_complete(&self, id: usize, topic: &str, success: bool) {
        let _ = (id, topic, success);
    }

    /// Called at the end of each iterative-planner iteration
    fn on_iteration(&self, iteration: usize, accumulated_chunks: usize) {
        let _ = (iteration, accumulated_chunks);
    }
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl RunProgress for NoProgress {}
