//! Local feature-hashing embedder.
//!
//! Maps canonical ingredient tokens (and adjacent token pairs) to a fixed number
//! of dimensions with signed hashing. No model download, fully deterministic; good
//! enough to drive the ranker offline and in tests.

use crate::embeddings::provider::EmbeddingProvider;
use crate::normalize::normalize;
use crate::types::{EngineError, Result};
use async_trait::async_trait;

/// Weights of the three hashed positions per term.
const POSITION_WEIGHTS: [f32; 3] = [1.0, 0.7, 0.5];
const BIGRAM_WEIGHT: f32 = 0.3;

/// Feature-hashing embedding provider.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create embedder producing `dimensions`-long vectors.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ConfigError` if `dimensions` is zero
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(EngineError::ConfigError(
                "Hash embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    /// Embed synchronously. Result is L2-normalized (zero vector for empty text).
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<String> = text
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .map(normalize)
            .filter(|t| !t.is_empty())
            .collect();

        let mut vector = vec![0.0f32; self.dimensions];
        for token in &tokens {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            for (slot, weight) in POSITION_WEIGHTS.iter().enumerate() {
                let (index, sign) = self.slot(bytes, slot);
                vector[index] += weight * sign;
            }
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{}|{}", pair[0], pair[1]);
            let digest = blake3::hash(bigram.as_bytes());
            let (index, sign) = self.slot(digest.as_bytes(), 0);
            vector[index] += BIGRAM_WEIGHT * sign;
        }

        super::l2_normalize(&mut vector);
        vector
    }

    /// Dimension index and sign taken from the `slot`-th 8-byte chunk of a digest.
    fn slot(&self, digest: &[u8; 32], slot: usize) -> (usize, f32) {
        let start = slot * 8;
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&digest[start..start + 8]);
        let value = u64::from_le_bytes(chunk);
        let index = (value >> 1) as usize % self.dimensions;
        let sign = if value & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = self.clone();
        let text = text.to_string();
        Ok(tokio::task::spawn_blocking(move || embedder.embed_sync(&text)).await?)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn system(&self) -> &'static str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::dot;

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64).unwrap();
        let a = embedder.embed_sync("egg flour sugar");
        let b = embedder.embed_sync("egg flour sugar");
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_surface_forms_embed_identically() {
        let embedder = HashEmbedder::new(64).unwrap();
        assert_eq!(embedder.embed_sync("Eggs, Tomatoes"), embedder.embed_sync("egg tomato"));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16).unwrap();
        assert!(embedder.embed_sync("   ").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_async_embed_matches_sync() {
        let embedder = HashEmbedder::new(32).unwrap();
        let async_vec = embedder.embed("butter milk").await.unwrap();
        assert_eq!(async_vec, embedder.embed_sync("butter milk"));
    }
}
