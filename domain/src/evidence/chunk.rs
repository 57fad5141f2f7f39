//! Evidence chunks - immutable retrieval results.
//!
//! An [`EvidenceChunk`] is one retrievable unit of text plus its relevance
//! score, the strategy that produced it, and source metadata. Chunks are
//! never mutated after creation; context expansion produces a new chunk
//! keyed by the middle passage's id.

use serde::{Deserialize, Serialize};

/// The retrieval strategy that produced a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Exact-match query against the graph-structured store
    Structured,
    /// Vector search with staged filter relaxation
    Hybrid,
    /// Pure nearest-neighbor vector search
    Semantic,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Structured => "structured",
            StrategyKind::Hybrid => "hybrid",
            StrategyKind::Semantic => "semantic",
        }
    }

    /// Whether results from this strategy carry similarity scores (as
    /// opposed to the fixed 1.0 of exact matches).
    pub fn is_similarity_based(&self) -> bool {
        matches!(self, StrategyKind::Hybrid | StrategyKind::Semantic)
    }

    pub fn all() -> [StrategyKind; 3] {
        [
            StrategyKind::Structured,
            StrategyKind::Hybrid,
            StrategyKind::Semantic,
        ]
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" => Ok(StrategyKind::Structured),
            "hybrid" => Ok(StrategyKind::Hybrid),
            "semantic" => Ok(StrategyKind::Semantic),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Source metadata attached to an evidence chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Original file the passage came from (used for citations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Number of neighboring passages merged in by context expansion
    #[serde(default, skip_serializing_if = "is_zero")]
    pub merged_neighbors: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// One retrievable unit of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChunk {
    /// Stable passage id, e.g. "BAC_10K_item1a_chunk_5"
    pub id: String,
    /// Passage text (possibly neighbor-merged)
    pub text: String,
    /// Relevance score in [0, 1]; exact matches are fixed at 1.0
    pub relevance: f64,
    /// Strategy that produced this chunk
    pub source: StrategyKind,
    pub metadata: ChunkMetadata,
}

impl EvidenceChunk {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        relevance: f64,
        source: StrategyKind,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            relevance: relevance.clamp(0.0, 1.0),
            source,
            metadata,
        }
    }

    /// Mean relevance over a batch; 0.0 for an empty batch.
    pub fn mean_relevance(chunks: &[EvidenceChunk]) -> f64 {
        if chunks.is_empty() {
            return 0.0;
        }
        chunks.iter().map(|c| c.relevance).sum::<f64>() / chunks.len() as f64
    }

    /// Number of distinct source strategies in a batch.
    pub fn source_diversity(chunks: &[EvidenceChunk]) -> usize {
        let mut seen = [false; 3];
        for chunk in chunks {
            seen[chunk.source as usize] = true;
        }
        seen.iter().filter(|s| **s).count()
    }

    /// Split an id of the form `<base>_chunk_<n>` into its base and index.
    pub fn split_chunk_id(id: &str) -> Option<(&str, usize)> {
        let (base, index) = id.rsplit_once("_chunk_")?;
        let index = index.parse().ok()?;
        Some((base, index))
    }

    /// Rebuild a chunk id from its base and index.
    pub fn join_chunk_id(base: &str, index: usize) -> String {
        format!("{base}_chunk_{index}")
    }
}
