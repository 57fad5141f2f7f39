//! Retrieval strategies.
//!
//! One trait, three implementations. Strategies are infallible at the
//! boundary: backend failures are logged and surface as empty results, so
//! the orchestrator's fallback logic only ever branches on "did we get
//! chunks", never on transport errors.

pub mod hybrid;
pub mod semantic;
pub mod structured;

pub use hybrid::HybridRetriever;
pub use semantic::SemanticRetriever;
pub use structured::StructuredRetriever;

use crate::ports::{StoredPassage, VectorHit};
use async_trait::async_trait;
use finsight_domain::{EvidenceChunk, FilterSet, StrategyKind};
use std::sync::Arc;

/// One retrieval request: the working query text, the active filters, and
/// a pagination window.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub query: String,
    pub filters: FilterSet,
    pub limit: usize,
    pub offset: usize,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, filters: FilterSet) -> Self {
        Self {
            query: query.into(),
            filters,
            limit: 20,
            offset: 0,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// A retrieval strategy. Returns the chunks it found; an empty vector
/// means either "nothing matched" or "backend down" - the orchestrator
/// treats both the same way.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<EvidenceChunk>;
}

/// The three strategies, addressable by kind.
#[derive(Clone)]
pub struct StrategySet {
    structured: Arc<dyn RetrievalStrategy>,
    hybrid: Arc<dyn RetrievalStrategy>,
    semantic: Arc<dyn RetrievalStrategy>,
}

impl StrategySet {
    pub fn new(
        structured: Arc<dyn RetrievalStrategy>,
        hybrid: Arc<dyn RetrievalStrategy>,
        semantic: Arc<dyn RetrievalStrategy>,
    ) -> Self {
        Self {
            structured,
            hybrid,
            semantic,
        }
    }

    pub fn get(&self, kind: StrategyKind) -> &Arc<dyn RetrievalStrategy> {
        match kind {
            StrategyKind::Structured => &self.structured,
            StrategyKind::Hybrid => &self.hybrid,
            StrategyKind::Semantic => &self.semantic,
        }
    }
}

pub(crate) fn chunk_from_passage(passage: StoredPassage, source: StrategyKind) -> EvidenceChunk {
    EvidenceChunk::new(passage.id, passage.text, 1.0, source, passage.metadata)
}

pub(crate) fn chunk_from_hit(hit: VectorHit, source: StrategyKind) -> EvidenceChunk {
    EvidenceChunk::new(hit.id, hit.text, hit.score, source, hit.metadata)
}
