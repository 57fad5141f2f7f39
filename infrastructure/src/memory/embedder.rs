//! Deterministic feature-hashing embedder.

use async_trait::async_trait;
use finsight_application::ports::{EmbeddingError, EmbeddingService};
use std::hash::{DefaultHasher, Hash, Hasher};

const DIMENSIONS: usize = 256;

/// Embeds text by hashing tokens into a fixed-size bag-of-words vector,
/// L2-normalized. No model behind it, fully deterministic. Pairs with
/// [`super::InMemoryVectorIndex`] for offline runs and integration tests;
/// both sides of a search must use the same embedder.
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn embed_sync(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_ascii_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % DIMENSIONS;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::embed_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = HashEmbedder::embed_sync("credit risk exposure");
        let b = HashEmbedder::embed_sync("credit risk exposure");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalized() {
        let v = HashEmbedder::embed_sync("liquidity coverage ratio details");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_token_order_irrelevant() {
        let a = HashEmbedder::embed_sync("risk credit");
        let b = HashEmbedder::embed_sync("credit risk");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashEmbedder::embed_sync("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
