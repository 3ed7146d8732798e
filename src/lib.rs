//! Plate core - recipe suggestion and ingredient substitution engine.
//!
//! Recipes are ranked by blending embedding similarity with canonical
//! ingredient overlap; substitutes come from a property graph, blending
//! scored substitution edges with shared-recipe co-occurrence.

pub mod config;
pub mod embeddings;
pub mod engine;
pub mod graph;
pub mod index;
pub mod normalize;
pub mod otel;
pub mod ranker;
pub mod storage;
pub mod substitution;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use engine::PlateEngine;
pub use types::{
    EngineError, PantryReport, RankedRecipe, Recipe, RecipeRef, Result, Substitute,
    SubstituteParams, SubstituteSource, SubstitutionResult, SuggestParams,
};
