//! Exact inner-product index.
//!
//! Stores all vectors in one contiguous row-major buffer and scores every row
//! per query (rayon-parallel). Exact and deterministic, which makes it the
//! reference for the HNSW index and the default for small catalogs.

use crate::embeddings::{dot, l2_normalize};
use crate::index::{select_top_k, VectorIndex, VectorSnapshot};
use crate::types::{EngineError, Neighbor, RecipeRef, Result};
use rayon::prelude::*;

/// Brute-force vector index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    /// Row-major unit vectors, `len * dim` floats
    data: Vec<f32>,
    dim: usize,
}

impl FlatIndex {
    /// Build from vectors; row `n` becomes `RecipeRef(n)`.
    ///
    /// Rows are L2-normalized on load so inner product equals cosine.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DimensionMismatch` if any row has the wrong length,
    /// `EngineError::ConfigError` if `dim` is zero or there are more than `u32::MAX` rows
    pub fn new(dim: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dim == 0 {
            return Err(EngineError::ConfigError("Index dimension must be > 0".to_string()));
        }
        if vectors.len() > u32::MAX as usize {
            return Err(EngineError::ConfigError(format!(
                "Too many vectors for one index: {}",
                vectors.len()
            )));
        }

        let mut data = Vec::with_capacity(vectors.len() * dim);
        for mut row in vectors {
            if row.len() != dim {
                return Err(EngineError::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            l2_normalize(&mut row);
            data.extend_from_slice(&row);
        }

        Ok(Self { data, dim })
    }

    /// Build from a loaded snapshot.
    pub fn from_snapshot(snapshot: VectorSnapshot) -> Result<Self> {
        Self::new(snapshot.dimensions, snapshot.vectors)
    }

    /// Stored (normalized) vector for `row`.
    pub fn vector(&self, row: RecipeRef) -> Option<&[f32]> {
        let start = row.0 as usize * self.dim;
        self.data.get(start..start + self.dim)
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }

        let hits: Vec<Neighbor> = self
            .data
            .par_chunks_exact(self.dim)
            .enumerate()
            .map(|(row, vector)| Neighbor {
                similarity: dot(vector, query),
                recipe_ref: RecipeRef(row as u32),
            })
            .collect();

        Ok(select_top_k(hits, k))
    }

    fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    fn system(&self) -> &'static str {
        "flat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatIndex {
        FlatIndex::new(
            3,
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0], // Normalized on load
                vec![-1.0, 0.0, 0.0],
                vec![0.6, 0.8, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_search_order() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 4).unwrap();

        let rows: Vec<u32> = hits.iter().map(|h| h.recipe_ref.0).collect();
        assert_eq!(rows, vec![0, 3, 1, 2]);
        assert!((hits[1].similarity - 0.6).abs() < 1e-6);
        assert!((hits[3].similarity + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = sample_index();
        assert_eq!(index.search(&[0.0, 1.0, 0.0], 50).unwrap().len(), 4);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = sample_index();
        let err = index.search(&[1.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { expected: 3, got: 2 }));
    }

    #[test]
    fn test_rows_are_normalized() {
        let index = sample_index();
        assert_eq!(index.vector(RecipeRef(1)), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(index.vector(RecipeRef(9)), None);
    }

    #[test]
    fn test_bad_row_rejected() {
        let err = FlatIndex::new(2, vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_empty_index() {
        let index = FlatIndex::new(2, vec![]).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
    }
}
