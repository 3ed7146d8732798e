//! Recipe data structures and ranking request/response types.

use crate::types::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row reference shared by the vector index and the metadata store.
///
/// Row `n` of the embedding snapshot describes the recipe stored under `RecipeRef(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeRef(pub u32);

impl RecipeRef {
    /// Big-endian key bytes (sorts in row order inside RocksDB).
    pub fn to_key(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Parse key bytes written by [`RecipeRef::to_key`].
    pub fn from_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = key.try_into().ok()?;
        Some(Self(u32::from_be_bytes(bytes)))
    }
}

impl fmt::Display for RecipeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable recipe record owned by the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier from the source dataset
    pub recipe_id: String,

    /// Display title
    pub title: String,

    /// Ingredient entities in listed order (may contain duplicates)
    pub ingredients: Vec<String>,

    /// Preparation steps
    #[serde(default)]
    pub directions: Vec<String>,

    /// Dataset the recipe came from
    #[serde(default)]
    pub source: String,

    /// Original URL
    #[serde(default)]
    pub link: String,
}

impl Recipe {
    /// Create a recipe with only a title and ingredients (fixtures, imports).
    pub fn new(recipe_id: impl Into<String>, title: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            title: title.into(),
            ingredients,
            directions: Vec::new(),
            source: String::new(),
            link: String::new(),
        }
    }
}

/// One nearest-neighbor hit: raw cosine similarity in [-1, 1] and the recipe row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub similarity: f32,
    pub recipe_ref: RecipeRef,
}

/// Parameters for hybrid recipe suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestParams {
    /// Number of ranked recipes to return (>= 1)
    pub top_n: usize,

    /// Weight of the overlap score in [0, 1]; semantic gets `1 - rerank_weight`
    pub rerank_weight: f64,

    /// Nearest neighbors fetched before filtering (>= 1)
    pub candidate_pool_size: usize,

    /// Minimum canonical ingredient overlap for a candidate to survive (>= 1)
    pub min_overlap: usize,
}

impl Default for SuggestParams {
    fn default() -> Self {
        Self {
            top_n: 5,
            rerank_weight: 0.6,
            candidate_pool_size: 50,
            min_overlap: 2,
        }
    }
}

impl SuggestParams {
    /// Reject out-of-range limits and weights. Nothing is coerced.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` naming the offending field
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(EngineError::invalid("top_n must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.rerank_weight) {
            return Err(EngineError::invalid(format!(
                "rerank_weight must be in [0, 1], got {}",
                self.rerank_weight
            )));
        }
        if self.candidate_pool_size == 0 {
            return Err(EngineError::invalid("candidate_pool_size must be >= 1"));
        }
        if self.min_overlap == 0 {
            return Err(EngineError::invalid("min_overlap must be >= 1"));
        }
        Ok(())
    }
}

/// A ranked recipe suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecipe {
    /// 1-based rank
    pub rank: usize,
    pub recipe_ref: RecipeRef,
    pub recipe_id: String,
    pub title: String,

    /// Recipe ingredients that match the query, in recipe order
    pub overlapping_ingredients: Vec<String>,

    pub semantic_score: f64,
    pub overlap_score: f64,
    pub combined_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_ref_key_ordering() {
        let a = RecipeRef(2).to_key();
        let b = RecipeRef(256).to_key();
        assert!(a < b);
        assert_eq!(RecipeRef::from_key(&b), Some(RecipeRef(256)));
        assert_eq!(RecipeRef::from_key(b"abc"), None);
    }

    #[test]
    fn test_suggest_params_validation() {
        assert!(SuggestParams::default().validate().is_ok());

        let bad = [
            SuggestParams { top_n: 0, ..Default::default() },
            SuggestParams { rerank_weight: 1.5, ..Default::default() },
            SuggestParams { rerank_weight: f64::NAN, ..Default::default() },
            SuggestParams { candidate_pool_size: 0, ..Default::default() },
            SuggestParams { min_overlap: 0, ..Default::default() },
        ];
        for params in bad {
            assert!(params.validate().unwrap_err().is_input_error(), "{:?}", params);
        }
    }

    #[test]
    fn test_recipe_deserializes_without_optional_fields() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"recipe_id": "7", "title": "Pancakes", "ingredients": ["egg", "flour"]}"#,
        )
        .unwrap();
        assert!(recipe.directions.is_empty());
        assert_eq!(recipe.ingredients.len(), 2);
    }
}
