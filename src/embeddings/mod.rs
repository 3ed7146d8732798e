//! Embedding generation with multiple providers.
//!
//! Supports:
//! - OpenAI embeddings (text-embedding-3-small/large, ada-002) over HTTP
//! - Local feature-hashing embeddings (no model, deterministic)
//!
//! Providers are selected from [`crate::config::EmbeddingConfig`].

mod hash;
mod openai;
mod provider;

pub use hash::HashEmbedder;
pub use openai::OpenAIEmbedder;
pub use provider::EmbeddingProvider;

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = dot(vector, vector).sqrt();
    if norm > f32::EPSILON && norm.is_finite() {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Inner product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
