//! In-memory vector index with cosine similarity.

use async_trait::async_trait;
use finsight_application::ports::{IndexError, MetadataFilter, VectorHit, VectorIndex};
use finsight_domain::ChunkMetadata;

/// One indexed passage with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedPassage {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Brute-force cosine search over an in-memory list.
pub struct InMemoryVectorIndex {
    entries: Vec<IndexedPassage>,
}

impl InMemoryVectorIndex {
    pub fn new(entries: Vec<IndexedPassage>) -> Self {
        Self { entries }
    }

    fn matches(metadata: &ChunkMetadata, filter: &MetadataFilter) -> bool {
        let eq_opt = |wanted: &Option<String>, got: &Option<String>| match (wanted, got) {
            (Some(w), Some(g)) => w.eq_ignore_ascii_case(g),
            (Some(_), None) => false,
            (None, _) => true,
        };
        eq_opt(&filter.entity, &metadata.entity)
            && (filter.years.is_empty()
                || metadata.year.is_some_and(|y| filter.years.contains(&y)))
            && eq_opt(&filter.quarter, &metadata.quarter)
            && eq_opt(&filter.doc_type, &metadata.doc_type)
            && eq_opt(&filter.section, &metadata.section)
    }
}

/// Cosine similarity mapped into [0, 1]. Zero vectors score 0.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (((dot / (norm_a * norm_b)) as f64 + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorHit>, IndexError> {
        let mut hits: Vec<VectorHit> = self
            .entries
            .iter()
            .filter(|e| Self::matches(&e.metadata, filter))
            .map(|e| VectorHit {
                id: e.id.clone(),
                score: cosine(embedding, &e.embedding),
                text: e.text.clone(),
                metadata: e.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, embedding: Vec<f32>, year: i32) -> IndexedPassage {
        IndexedPassage {
            id: id.to_string(),
            text: format!("text for {id}"),
            embedding,
            metadata: ChunkMetadata {
                entity: Some("BAC".to_string()),
                year: Some(year),
                ..ChunkMetadata::default()
            },
        }
    }

    #[tokio::test]
    async fn test_closest_vector_ranks_first() {
        let index = InMemoryVectorIndex::new(vec![
            entry("far_chunk_1", vec![0.0, 1.0], 2023),
            entry("near_chunk_1", vec![1.0, 0.05], 2023),
        ]);

        let hits = index
            .search(&[1.0, 0.0], 10, &MetadataFilter::default())
            .await
            .unwrap();
        assert_eq!(hits[0].id, "near_chunk_1");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_year_set_membership_filter() {
        let index = InMemoryVectorIndex::new(vec![
            entry("a_chunk_1", vec![1.0, 0.0], 2021),
            entry("b_chunk_1", vec![1.0, 0.0], 2023),
        ]);

        let filter = MetadataFilter {
            years: vec![2022, 2023, 2024],
            ..MetadataFilter::default()
        };
        let hits = index.search(&[1.0, 0.0], 10, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b_chunk_1");
    }

    #[tokio::test]
    async fn test_scores_stay_in_unit_interval() {
        let index = InMemoryVectorIndex::new(vec![
            entry("a_chunk_1", vec![-1.0, 0.0], 2023),
            entry("b_chunk_1", vec![1.0, 0.0], 2023),
        ]);

        let hits = index
            .search(&[1.0, 0.0], 10, &MetadataFilter::default())
            .await
            .unwrap();
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }
}
