//! Structured retrieval - exact-match queries against the document store.

use super::{RetrievalRequest, RetrievalStrategy, chunk_from_passage};
use crate::config::RetrievalParams;
use crate::ports::StructuredStore;
use async_trait::async_trait;
use finsight_domain::{EvidenceChunk, StrategyKind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Exact-match retrieval from the structured store.
///
/// Results carry a fixed relevance of 1.0: a passage either matches the
/// filters or it does not. With no filters at all the store returns its
/// unfiltered recent-first page, which keeps the strategy usable as a
/// diagnostic probe.
pub struct StructuredRetriever {
    store: Arc<dyn StructuredStore>,
    params: RetrievalParams,
}

impl StructuredRetriever {
    pub fn new(store: Arc<dyn StructuredStore>, params: RetrievalParams) -> Self {
        Self { store, params }
    }
}

#[async_trait]
impl RetrievalStrategy for StructuredRetriever {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Structured
    }

    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<EvidenceChunk> {
        let limit = if request.limit > 0 {
            request.limit
        } else {
            self.params.page_size
        };
        match self
            .store
            .query(&request.filters, limit, request.offset)
            .await
        {
            Ok(passages) => {
                debug!(
                    count = passages.len(),
                    offset = request.offset,
                    "structured query returned"
                );
                passages
                    .into_iter()
                    .map(|p| chunk_from_passage(p, StrategyKind::Structured))
                    .collect()
            }
            Err(e) => {
                warn!("structured store query failed: {e}");
                Vec::new()
            }
        }
    }
}
