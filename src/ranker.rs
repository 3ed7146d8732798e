//! Hybrid recipe ranking: semantic similarity blended with ingredient overlap.
//!
//! # Pipeline
//!
//! ```text
//! ingredients ──► canonical keys ──┐
//!      │                           │
//!      └─► query text ─► embed ─► search(k) ─► get_recipe ─► overlap filter ─► blend ─► top_n
//! ```
//!
//! `overlap_score` is the fraction of the *caller's* distinct ingredients a
//! recipe uses, not the fraction of the recipe the caller can cover. A
//! two-ingredient recipe matching both of three inputs scores 2/3.
//!
//! Ties on `combined_score` keep neighbor-search order (stable sort).

use crate::embeddings::{l2_normalize, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::normalize::{dedup_preserving_order, normalize};
use crate::otel::{record_result_metrics, record_store_rows, store_span};
use crate::storage::RecipeStore;
use crate::types::{
    clamp_unit, Dependency, EngineError, Neighbor, RankedRecipe, Recipe, Result, SuggestParams,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{Instrument, Span};

/// Slack above 1.0 tolerated before a similarity is reported as malformed
const SIMILARITY_EPSILON: f64 = 1e-4;

/// Canonical form of the caller's ingredient list.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientQuery {
    /// Text sent to the embedding provider
    pub text: String,
    /// Distinct canonical keys; the overlap denominator is `keys.len()`
    pub keys: HashSet<String>,
}

impl IngredientQuery {
    /// Build from raw input strings.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if no input has a non-empty key
    pub fn parse(ingredients: &[String]) -> Result<Self> {
        let terms: Vec<&str> = ingredients
            .iter()
            .map(|i| i.trim())
            .filter(|i| !normalize(i).is_empty())
            .collect();
        if terms.is_empty() {
            return Err(EngineError::invalid("ingredients must not be empty"));
        }

        Ok(Self {
            text: terms.join(" "),
            keys: terms.iter().map(|t| normalize(t)).collect(),
        })
    }
}

/// Candidate that passed the overlap filter, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub neighbor: Neighbor,
    pub recipe: Recipe,
    /// Surface names of overlapping recipe ingredients, recipe order
    pub overlapping: Vec<String>,
    pub semantic_score: f64,
    pub overlap_score: f64,
    pub combined_score: f64,
}

/// `(1 - w) * semantic + w * overlap`, clamped to [0, 1].
pub fn blend(semantic_score: f64, overlap_score: f64, rerank_weight: f64) -> f64 {
    clamp_unit((1.0 - rerank_weight) * semantic_score + rerank_weight * overlap_score)
}

/// Clamp a raw cosine to [0, 1]. Negative values floor to 0 silently;
/// non-finite or > 1 values are upstream defects and get a warning.
fn semantic_score(neighbor: &Neighbor) -> f64 {
    let raw = f64::from(neighbor.similarity);
    if !raw.is_finite() || raw > 1.0 + SIMILARITY_EPSILON {
        tracing::warn!(
            recipe_ref = %neighbor.recipe_ref,
            similarity = raw,
            "Malformed similarity from index, clamping"
        );
    }
    clamp_unit(raw)
}

/// Score one candidate against the query; `None` if overlap < `min_overlap`.
pub fn score_candidate(
    query: &IngredientQuery,
    neighbor: Neighbor,
    recipe: Recipe,
    params: &SuggestParams,
) -> Option<ScoredCandidate> {
    // Doubly-listed ingredients count once
    let overlapping: Vec<String> = dedup_preserving_order(&recipe.ingredients)
        .into_iter()
        .filter(|(_, key)| query.keys.contains(key))
        .map(|(surface, _)| surface)
        .collect();

    if overlapping.len() < params.min_overlap {
        tracing::debug!(
            recipe_ref = %neighbor.recipe_ref,
            overlap = overlapping.len(),
            min_overlap = params.min_overlap,
            "Candidate below overlap threshold"
        );
        return None;
    }

    let semantic_score = semantic_score(&neighbor);
    let overlap_score = clamp_unit(overlapping.len() as f64 / query.keys.len() as f64);
    let combined_score = blend(semantic_score, overlap_score, params.rerank_weight);

    Some(ScoredCandidate {
        neighbor,
        recipe,
        overlapping,
        semantic_score,
        overlap_score,
        combined_score,
    })
}

/// Sort by `combined_score` descending (stable) and keep the first `top_n`.
pub fn rank(mut scored: Vec<ScoredCandidate>, top_n: usize) -> Vec<RankedRecipe> {
    scored.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, c)| RankedRecipe {
            rank: i + 1,
            recipe_ref: c.neighbor.recipe_ref,
            recipe_id: c.recipe.recipe_id,
            title: c.recipe.title,
            overlapping_ingredients: c.overlapping,
            semantic_score: c.semantic_score,
            overlap_score: c.overlap_score,
            combined_score: c.combined_score,
        })
        .collect()
}

/// Neighbor search plus metadata fetch. Blocking; runs on the worker pool.
fn fetch_candidates(
    index: &dyn VectorIndex,
    store: &dyn RecipeStore,
    query: &[f32],
    k: usize,
) -> Result<Vec<(Neighbor, Recipe)>> {
    let hits = {
        let span = store_span(Dependency::VectorIndex, index.system(), "search");
        let _guard = span.enter();
        let hits = index.search(query, k)?;
        record_store_rows(hits.len());
        hits
    };

    let span = store_span(Dependency::RecipeStore, store.system(), "get_recipe");
    let _guard = span.enter();
    let mut candidates = Vec::with_capacity(hits.len());
    for hit in hits {
        let recipe = store.get_recipe(hit.recipe_ref)?;
        candidates.push((hit, recipe));
    }
    record_store_rows(candidates.len());
    Ok(candidates)
}

/// Recipe ranker over an embedding provider, a vector index and a metadata store.
#[derive(Clone)]
pub struct HybridRanker {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn RecipeStore>,
}

impl HybridRanker {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn RecipeStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    /// Rank recipes for `ingredients`.
    ///
    /// # Arguments
    ///
    /// * `ingredients` - Free-text ingredient names (at least one non-blank)
    /// * `params` - Limits and blend weight
    ///
    /// # Returns
    ///
    /// Up to `top_n` recipes, best first. Fewer (or none) when not enough
    /// candidates pass `min_overlap`.
    ///
    /// # Errors
    ///
    /// - `EngineError::InvalidInput` for empty ingredients or out-of-range params,
    ///   before any port is called
    /// - `EngineError::PoolTooLarge` if the index cannot return
    ///   `candidate_pool_size` neighbors per search, also before any port call
    /// - `EngineError::Unavailable` if a port fails
    /// - `EngineError::DimensionMismatch` if the embedder and index disagree
    pub async fn suggest(
        &self,
        ingredients: &[String],
        params: &SuggestParams,
    ) -> Result<Vec<RankedRecipe>> {
        params.validate()?;
        let query = IngredientQuery::parse(ingredients)?;
        if let Some(limit) = self.index.max_neighbors() {
            if params.candidate_pool_size > limit {
                return Err(EngineError::PoolTooLarge {
                    requested: params.candidate_pool_size,
                    limit,
                });
            }
        }

        let mut vector = self
            .embedder
            .embed(&query.text)
            .instrument(store_span(Dependency::Embedding, self.embedder.system(), "embed"))
            .await?;
        l2_normalize(&mut vector);

        let expected = self.index.dimensions();
        if vector.len() != expected {
            return Err(EngineError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }

        let index = Arc::clone(&self.index);
        let store = Arc::clone(&self.store);
        let k = params.candidate_pool_size;
        let parent = Span::current();
        let candidates = tokio::task::spawn_blocking(move || {
            let _guard = parent.enter();
            fetch_candidates(index.as_ref(), store.as_ref(), &vector, k)
        })
        .await??;

        let pool = candidates.len();
        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|(neighbor, recipe)| score_candidate(&query, neighbor, recipe, params))
            .collect();
        let survivors = scored.len();
        let ranked = rank(scored, params.top_n);

        record_result_metrics(pool, ranked.len());
        tracing::info!(
            candidates = pool,
            survivors,
            returned = ranked.len(),
            "Ranked recipe suggestions"
        );
        Ok(ranked)
    }
}
