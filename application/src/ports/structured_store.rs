//! Structured document store port
//!
//! Exact-match and text queries against the indexed filing corpus, plus
//! the discovery queries the iterative planner uses for metadata
//! clarification.

use async_trait::async_trait;
use finsight_domain::{ChunkMetadata, FilterSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Timeout")]
    Timeout,
}

/// One stored passage with its source metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPassage {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// The structured store holding indexed filing passages.
///
/// `query` matches metadata exactly; an empty filter set returns an
/// unfiltered recent-first page. Ordering is deterministic for identical
/// store contents.
#[async_trait]
pub trait StructuredStore: Send + Sync {
    /// Exact-match metadata query with pagination.
    async fn query(
        &self,
        filters: &FilterSet,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredPassage>, StoreError>;

    /// Full-text term search, optionally scoped to an entity.
    async fn search_text(
        &self,
        entity: Option<&str>,
        term: &str,
        limit: usize,
    ) -> Result<Vec<StoredPassage>, StoreError>;

    /// Fetch specific passages by id, used for context expansion. Missing
    /// ids are silently absent from the result.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<StoredPassage>, StoreError>;

    /// Distinct years with data for an entity (all entities when None),
    /// most recent first.
    async fn available_years(&self, entity: Option<&str>) -> Result<Vec<i32>, StoreError>;

    /// Distinct sections available for an entity and year.
    async fn available_sections(
        &self,
        entity: &str,
        year: i32,
    ) -> Result<Vec<String>, StoreError>;
}
