//! Semantic retrieval - pure nearest-neighbor vector search.

use super::{RetrievalRequest, RetrievalStrategy, chunk_from_hit};
use crate::config::RetrievalParams;
use crate::ports::{EmbeddingService, MetadataFilter, VectorIndex};
use async_trait::async_trait;
use finsight_domain::{EvidenceChunk, StrategyKind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Unfiltered vector search with a strict entity post-filter.
///
/// The index is searched without metadata constraints so topically close
/// passages from any filing can surface; when the filter set names an
/// entity, hits from other entities are dropped afterwards rather than
/// excluded up front.
pub struct SemanticRetriever {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    params: RetrievalParams,
}

impl SemanticRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            embedder,
            index,
            params,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for SemanticRetriever {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Semantic
    }

    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<EvidenceChunk> {
        let embedding = match self.embedder.embed(&request.query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("embedding failed: {e}");
                return Vec::new();
            }
        };

        let top_k = self.params.top_k + request.offset;
        let hits = match self
            .index
            .search(&embedding, top_k, &MetadataFilter::default())
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!("vector search failed: {e}");
                return Vec::new();
            }
        };

        // Offset pages over the raw ranked hits, before the entity filter,
        // so later pages can reach matches pushed deep by other entities.
        let entity = request.filters.entity.as_deref();
        let chunks: Vec<EvidenceChunk> = hits
            .into_iter()
            .skip(request.offset)
            .filter(|hit| match entity {
                Some(wanted) => hit
                    .metadata
                    .entity
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .take(self.params.result_cap.min(request.limit.max(1)))
            .map(|hit| chunk_from_hit(hit, StrategyKind::Semantic))
            .collect();

        debug!(count = chunks.len(), "semantic search returned");
        chunks
    }
}
