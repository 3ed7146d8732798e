//! Approximate index backed by `instant-distance` (pure Rust HNSW).
//!
//! Distance is `1 - dot(a, b)` over unit vectors, so the reported similarity is
//! `1 - distance`, the same cosine the flat index returns.

use crate::embeddings::{dot, l2_normalize};
use crate::index::{neighbor_order, VectorIndex, VectorSnapshot};
use crate::types::{EngineError, Neighbor, RecipeRef, Result};
use instant_distance::{Builder, HnswMap, Point, Search};

/// HNSW build/search parameters.
#[derive(Debug, Clone, Copy)]
pub struct HnswParams {
    /// Candidate list size while building (higher = better graph, slower build)
    pub ef_construction: usize,

    /// Candidate list size while searching; also the most results one query returns
    pub ef_search: usize,

    /// RNG seed for reproducible builds
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            ef_construction: 100,
            ef_search: 100,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct UnitVector(Vec<f32>);

impl Point for UnitVector {
    fn distance(&self, other: &Self) -> f32 {
        1.0 - dot(&self.0, &other.0)
    }
}

/// HNSW vector index.
pub struct HnswIndex {
    /// `None` for an empty catalog
    map: Option<HnswMap<UnitVector, RecipeRef>>,
    dim: usize,
    len: usize,
    ef_search: usize,
}

impl HnswIndex {
    /// Build the graph; row `n` becomes `RecipeRef(n)`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DimensionMismatch` if any row has the wrong length
    pub fn build(dim: usize, vectors: Vec<Vec<f32>>, params: HnswParams) -> Result<Self> {
        if dim == 0 {
            return Err(EngineError::ConfigError("Index dimension must be > 0".to_string()));
        }

        let len = vectors.len();
        let mut points = Vec::with_capacity(len);
        let mut refs = Vec::with_capacity(len);
        for (row, mut vector) in vectors.into_iter().enumerate() {
            if vector.len() != dim {
                return Err(EngineError::DimensionMismatch {
                    expected: dim,
                    got: vector.len(),
                });
            }
            l2_normalize(&mut vector);
            points.push(UnitVector(vector));
            refs.push(RecipeRef(row as u32));
        }

        let map = (len > 0).then(|| {
            Builder::default()
                .ef_construction(params.ef_construction)
                .ef_search(params.ef_search)
                .seed(params.seed)
                .build(points, refs)
        });

        tracing::info!(vectors = len, dim, ef_search = params.ef_search, "Built HNSW index");

        Ok(Self {
            map,
            dim,
            len,
            ef_search: params.ef_search,
        })
    }

    /// Build from a loaded snapshot.
    pub fn from_snapshot(snapshot: VectorSnapshot, params: HnswParams) -> Result<Self> {
        Self::build(snapshot.dimensions, snapshot.vectors, params)
    }
}

impl VectorIndex for HnswIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        // The graph search never yields more than ef_search items
        if k > self.ef_search {
            return Err(EngineError::PoolTooLarge {
                requested: k,
                limit: self.ef_search,
            });
        }
        let map = match &self.map {
            Some(map) if k > 0 => map,
            _ => return Ok(Vec::new()),
        };

        let point = UnitVector(query.to_vec());
        let mut search = Search::default();
        let mut hits: Vec<Neighbor> = map
            .search(&point, &mut search)
            .take(k)
            .map(|item| Neighbor {
                similarity: 1.0 - item.distance,
                recipe_ref: *item.value,
            })
            .collect();

        hits.sort_by(neighbor_order);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    fn max_neighbors(&self) -> Option<usize> {
        Some(self.ef_search)
    }

    fn system(&self) -> &'static str {
        "hnsw"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FlatIndex;

    fn vectors() -> Vec<Vec<f32>> {
        (0..40)
            .map(|i| {
                let angle = i as f32 * 0.15;
                vec![angle.cos(), angle.sin(), 0.1 * (i % 3) as f32]
            })
            .collect()
    }

    #[test]
    fn test_nearest_matches_flat_index() {
        let flat = FlatIndex::new(3, vectors()).unwrap();
        let hnsw = HnswIndex::build(3, vectors(), HnswParams::default()).unwrap();

        let query = [1.0, 0.0, 0.0];
        let exact = flat.search(&query, 1).unwrap();
        let approx = hnsw.search(&query, 1).unwrap();

        assert_eq!(approx[0].recipe_ref, exact[0].recipe_ref);
        assert!((approx[0].similarity - exact[0].similarity).abs() < 1e-5);
    }

    #[test]
    fn test_results_sorted_and_bounded() {
        let hnsw = HnswIndex::build(3, vectors(), HnswParams::default()).unwrap();
        let hits = hnsw.search(&[0.0, 1.0, 0.0], 5).unwrap();

        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_empty_catalog() {
        let hnsw = HnswIndex::build(3, vec![], HnswParams::default()).unwrap();
        assert!(hnsw.is_empty());
        assert!(hnsw.search(&[1.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_pool_beyond_ef_search_rejected() {
        let params = HnswParams {
            ef_search: 10,
            ..HnswParams::default()
        };
        let hnsw = HnswIndex::build(3, vectors(), params).unwrap();
        assert_eq!(hnsw.max_neighbors(), Some(10));

        assert_eq!(hnsw.search(&[1.0, 0.0, 0.0], 10).unwrap().len(), 10);
        assert!(matches!(
            hnsw.search(&[1.0, 0.0, 0.0], 11),
            Err(EngineError::PoolTooLarge { requested: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let hnsw = HnswIndex::build(3, vectors(), HnswParams::default()).unwrap();
        assert!(hnsw.search(&[1.0], 3).is_err());
    }
}
