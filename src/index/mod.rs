//! Nearest-neighbor search over recipe embeddings.
//!
//! Two implementations of the [`VectorIndex`] port:
//! - **Flat**: exact inner-product scan, parallelized with rayon
//! - **HNSW**: approximate graph search via `instant-distance`
//!
//! Both load once from a [`VectorSnapshot`] and are immutable afterwards, so
//! concurrent searches need no locking. [`IndexHandle`] adds copy-and-swap
//! replacement on top: a search always sees one complete index.
//!
//! # Example
//!
//! ```rust,ignore
//! let snapshot = VectorSnapshot::load("recipes.vec")?;
//! let index = FlatIndex::from_snapshot(snapshot)?;
//!
//! // Row n of the snapshot is RecipeRef(n)
//! let hits = index.search(&query, 50)?;
//! ```

mod flat;
mod hnsw;
mod snapshot;

pub use flat::FlatIndex;
pub use hnsw::{HnswIndex, HnswParams};
pub use snapshot::VectorSnapshot;

use crate::types::{Neighbor, Result};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

/// Nearest-neighbor index port.
///
/// Searches are CPU-bound and synchronous; async callers run them on the
/// blocking pool.
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` neighbors of `query`, most similar first.
    ///
    /// Similarity is the inner product, i.e. cosine for unit vectors.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DimensionMismatch` if `query` has the wrong length
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality.
    fn dimensions(&self) -> usize;

    /// Largest `k` a single search can satisfy; `None` when unbounded.
    fn max_neighbors(&self) -> Option<usize> {
        None
    }

    /// Backend name used in spans (`flat`, `hnsw`).
    fn system(&self) -> &'static str;
}

/// Ordering for neighbor lists: higher similarity first, lower row on ties.
pub(crate) fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.recipe_ref.cmp(&b.recipe_ref))
}

/// Keep the `k` best neighbors, sorted by [`neighbor_order`].
pub(crate) fn select_top_k(mut hits: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    if k == 0 {
        return Vec::new();
    }
    if hits.len() > k {
        hits.select_nth_unstable_by(k - 1, neighbor_order);
        hits.truncate(k);
    }
    hits.sort_by(neighbor_order);
    hits
}

/// Copy-and-swap holder for the live index.
///
/// Readers clone the current `Arc` and search without holding the lock; `swap`
/// installs a fully built replacement. In-flight searches keep using the index
/// they started with until they finish.
pub struct IndexHandle {
    current: RwLock<Arc<dyn VectorIndex>>,
}

impl IndexHandle {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            current: RwLock::new(index),
        }
    }

    /// Index that new searches will use.
    pub fn snapshot(&self) -> Arc<dyn VectorIndex> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the live index, returning the previous one.
    pub fn swap(&self, next: Arc<dyn VectorIndex>) -> Arc<dyn VectorIndex> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

impl VectorIndex for IndexHandle {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.snapshot().search(query, k)
    }

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn dimensions(&self) -> usize {
        self.snapshot().dimensions()
    }

    fn max_neighbors(&self) -> Option<usize> {
        self.snapshot().max_neighbors()
    }

    fn system(&self) -> &'static str {
        self.snapshot().system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecipeRef;

    fn hit(similarity: f32, row: u32) -> Neighbor {
        Neighbor {
            similarity,
            recipe_ref: RecipeRef(row),
        }
    }

    #[test]
    fn test_select_top_k() {
        let hits = vec![hit(0.1, 0), hit(0.9, 1), hit(0.5, 2), hit(0.9, 3)];
        let top = select_top_k(hits, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0], hit(0.9, 1)); // Tie: lower row first
        assert_eq!(top[1], hit(0.9, 3));
        assert_eq!(top[2], hit(0.5, 2));
    }

    #[test]
    fn test_select_top_k_zero() {
        assert!(select_top_k(vec![hit(0.3, 0)], 0).is_empty());
    }

    #[test]
    fn test_handle_swap_keeps_old_snapshot_alive() {
        let first = FlatIndex::new(2, vec![vec![1.0, 0.0]]).unwrap();
        let second = FlatIndex::new(2, vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let handle = IndexHandle::new(Arc::new(first));

        let in_flight = handle.snapshot();
        let previous = handle.swap(Arc::new(second));

        assert_eq!(in_flight.len(), 1);
        assert_eq!(previous.len(), 1);
        assert_eq!(handle.len(), 2);
        let hits = handle.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].recipe_ref, RecipeRef(0));
    }
}
