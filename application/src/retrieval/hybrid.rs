//! Hybrid retrieval - filtered vector search with staged relaxation.
//!
//! The ladder tries the strictest interpretation of the filters first and
//! only relaxes when a rung returns nothing: exact filters, then a ±1 and
//! ±2 year window, then entity-only, then structured text search with
//! context expansion, then one unfiltered diagnostic search. Chunks
//! recovered through relaxation get a confidence boost so downstream
//! validation does not punish them for the weaker match.

use super::{RetrievalRequest, RetrievalStrategy, chunk_from_hit, chunk_from_passage};
use crate::config::RetrievalParams;
use crate::ports::{EmbeddingService, MetadataFilter, StoredPassage, StructuredStore, VectorIndex};
use async_trait::async_trait;
use finsight_domain::{EvidenceChunk, FilterSet, StrategyKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct HybridRetriever {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn StructuredStore>,
    params: RetrievalParams,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn StructuredStore>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            params,
        }
    }

    fn metadata_filter(filters: &FilterSet, year_window: i32) -> MetadataFilter {
        let years = match filters.year {
            Some(year) => ((year - year_window)..=(year + year_window)).collect(),
            None => Vec::new(),
        };
        MetadataFilter {
            entity: filters.entity.clone(),
            years,
            quarter: if year_window == 0 {
                filters.quarter.clone()
            } else {
                None
            },
            doc_type: filters.doc_type.clone(),
            section: filters.section.clone(),
        }
    }

    fn boost(&self, mut chunks: Vec<EvidenceChunk>) -> Vec<EvidenceChunk> {
        for chunk in &mut chunks {
            chunk.relevance = (chunk.relevance * self.params.relaxed_confidence_boost).clamp(0.0, 1.0);
        }
        chunks
    }

    async fn vector_rung(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        request: &RetrievalRequest,
    ) -> Vec<EvidenceChunk> {
        let top_k = self.params.top_k + request.offset;
        match self.index.search(embedding, top_k, filter).await {
            Ok(hits) => hits
                .into_iter()
                .skip(request.offset)
                .take(self.params.result_cap.min(request.limit.max(1)))
                .map(|hit| chunk_from_hit(hit, StrategyKind::Hybrid))
                .collect(),
            Err(e) => {
                warn!("hybrid vector search failed: {e}");
                Vec::new()
            }
        }
    }

    /// Merge each passage with its store neighbors (`X_chunk_{N-1}` and
    /// `X_chunk_{N+1}`), keyed by the middle id. Passages without a
    /// parseable chunk index, or whose neighbors are missing, degrade to
    /// themselves.
    async fn expand_context(&self, passages: Vec<StoredPassage>) -> Vec<EvidenceChunk> {
        let mut chunks = Vec::with_capacity(passages.len());
        for passage in passages {
            let Some((base, index)) = EvidenceChunk::split_chunk_id(&passage.id) else {
                chunks.push(chunk_from_passage(passage, StrategyKind::Hybrid));
                continue;
            };

            let mut wanted = Vec::new();
            if index > 0 {
                wanted.push(EvidenceChunk::join_chunk_id(base, index - 1));
            }
            wanted.push(passage.id.clone());
            wanted.push(EvidenceChunk::join_chunk_id(base, index + 1));

            let mut neighbors = match self.store.fetch_by_ids(&wanted).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("context expansion fetch failed: {e}");
                    chunks.push(chunk_from_passage(passage, StrategyKind::Hybrid));
                    continue;
                }
            };

            neighbors.sort_by_key(|p| {
                EvidenceChunk::split_chunk_id(&p.id).map_or(usize::MAX, |(_, i)| i)
            });
            let merged_neighbors = neighbors.len().saturating_sub(1);
            let text = neighbors
                .iter()
                .map(|p| p.text.trim())
                .collect::<Vec<_>>()
                .join("\n");

            let mut metadata = passage.metadata;
            metadata.merged_neighbors = merged_neighbors;
            if text.is_empty() {
                chunks.push(EvidenceChunk::new(
                    passage.id,
                    passage.text,
                    1.0,
                    StrategyKind::Hybrid,
                    metadata,
                ));
            } else {
                chunks.push(EvidenceChunk::new(
                    passage.id,
                    text,
                    1.0,
                    StrategyKind::Hybrid,
                    metadata,
                ));
            }
        }
        chunks
    }
}

#[async_trait]
impl RetrievalStrategy for HybridRetriever {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<EvidenceChunk> {
        let embedding = match self.embedder.embed(&request.query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("embedding failed: {e}");
                return Vec::new();
            }
        };

        // Rung 1: exact filters
        let exact = Self::metadata_filter(&request.filters, 0);
        let chunks = self.vector_rung(&embedding, &exact, request).await;
        if !chunks.is_empty() {
            debug!(count = chunks.len(), "hybrid exact-filter match");
            return chunks;
        }

        // Rungs 2-3: widen the temporal window, only meaningful with a year
        if request.filters.year.is_some() {
            for window in [1, 2] {
                let relaxed = Self::metadata_filter(&request.filters, window);
                let chunks = self.vector_rung(&embedding, &relaxed, request).await;
                if !chunks.is_empty() {
                    info!(window, count = chunks.len(), "hybrid matched with relaxed year window");
                    return self.boost(chunks);
                }
            }
        }

        // Rung 4: entity-only
        if request.filters.entity.is_some() && !request.filters.entity_only().is_empty() {
            let entity_only = Self::metadata_filter(&request.filters.entity_only(), 0);
            let chunks = self.vector_rung(&embedding, &entity_only, request).await;
            if !chunks.is_empty() {
                info!(count = chunks.len(), "hybrid matched on entity only");
                return self.boost(chunks);
            }
        }

        // Rung 5: structured text search with context expansion
        let term = request
            .filters
            .terms
            .first()
            .cloned()
            .unwrap_or_else(|| request.query.clone());
        match self
            .store
            .search_text(request.filters.entity.as_deref(), &term, request.limit.max(1))
            .await
        {
            Ok(passages) if !passages.is_empty() => {
                info!(count = passages.len(), "hybrid fell through to text search");
                let expanded = self.expand_context(passages).await;
                return self.boost(expanded);
            }
            Ok(_) => {}
            Err(e) => warn!("hybrid text search failed: {e}"),
        }

        // Rung 6: unfiltered diagnostic probe
        let chunks = self
            .vector_rung(&embedding, &MetadataFilter::default(), request)
            .await;
        if chunks.is_empty() {
            debug!("hybrid ladder exhausted with no results");
        } else {
            info!(count = chunks.len(), "hybrid diagnostic search matched");
        }
        chunks
    }
}
