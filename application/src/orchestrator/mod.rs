//! Query orchestration.
//!
//! Two orchestrators implement the [`Orchestrator`] trait: the routed
//! state machine (plan, retrieve, validate, fall back, synthesize) and
//! the iterative critique-driven planner. Multi-topic queries go through
//! the parallel runner and master synthesizer inside the routed
//! orchestrator.

pub mod iterative;
pub mod parallel;
pub mod state_machine;

pub use iterative::IterativeOrchestrator;
pub use parallel::ParallelRunner;
pub use state_machine::{RoutedOrchestrator, SinglePassEngine};

use crate::ports::{CompletionError, CompletionService, RunProgress};
use async_trait::async_trait;
use finsight_domain::{
    FilterSet, Query, QueryResponse, parse_filter_extraction, prompt::filter_extraction_prompt,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while orchestrating a query run
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error("Completion service error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Run cancelled")]
    Cancelled,
}

/// A query orchestrator: turns raw query text into a final response.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn run_query(
        &self,
        query: &Query,
        progress: &dyn RunProgress,
    ) -> Result<QueryResponse, OrchestrateError>;
}

/// Extract filters via the completion service, falling back to the
/// lexical scan for anything it misses - and entirely when the call
/// fails. Extraction never fails a run.
pub(crate) async fn extract_filters(
    completion: &dyn CompletionService,
    query: &str,
) -> FilterSet {
    let lexical = FilterSet::from_lexical_scan(query);
    match completion.complete(&filter_extraction_prompt(query)).await {
        Ok(text) => {
            let mut filters = parse_filter_extraction(&text);
            filters.merge_missing(lexical);
            debug!(%filters, "extracted filters");
            filters
        }
        Err(e) => {
            warn!("filter extraction failed, using lexical scan: {e}");
            lexical
        }
    }
}
