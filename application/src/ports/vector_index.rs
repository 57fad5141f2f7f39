//! Vector index port

use async_trait::async_trait;
use finsight_domain::ChunkMetadata;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Timeout")]
    Timeout,
}

/// Metadata constraints applied inside a vector search.
///
/// `years` is set-membership: a passage matches when its year is any of
/// the listed years. This is what lets the hybrid ladder widen a temporal
/// window without issuing one search per year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub entity: Option<String>,
    pub years: Vec<i32>,
    pub quarter: Option<String>,
    pub doc_type: Option<String>,
    pub section: Option<String>,
}

impl MetadataFilter {
    pub fn is_empty(&self) -> bool {
        self.entity.is_none()
            && self.years.is_empty()
            && self.quarter.is_none()
            && self.doc_type.is_none()
            && self.section.is_none()
    }
}

/// One vector search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    /// Cosine similarity in [0, 1]
    pub score: f64,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Nearest-neighbor search over embedded passages.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorHit>, IndexError>;
}
