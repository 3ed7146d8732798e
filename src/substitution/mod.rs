//! Ingredient substitution resolution.
//!
//! Two [`Resolver`]s read the substitution graph:
//! - [`DirectResolver`]: scored SUBSTITUTES_WITH edges, context first, then all edges
//! - [`CooccurrenceResolver`]: ingredients that share recipes, scored by frequency
//!
//! [`HybridBlender`] composes the two into one list; [`pantry_report`] splits
//! a recipe's ingredients into have/missing and finds substitutes for the gaps.

mod blender;
mod cooccurrence;
mod direct;
mod pantry;

pub use blender::HybridBlender;
pub use cooccurrence::{CooccurrenceResolver, DEFAULT_COOCCURRENCE_CEILING};
pub use direct::DirectResolver;
pub use pantry::pantry_report;

use crate::normalize::normalize;
use crate::types::{clamp_unit, EngineError, Result, SubstitutionResult};
use async_trait::async_trait;

/// Ingredient -> ranked substitute candidates.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve up to `top_k` substitutes for `ingredient` (raw text).
    ///
    /// `matched_context` is true only when `context` was given and edges for
    /// it existed. Resolvers that have no notion of context ignore it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` for a blank ingredient or
    /// `top_k == 0`, and `EngineError::Unavailable` if the graph fails
    async fn resolve(
        &self,
        ingredient: &str,
        context: Option<&str>,
        top_k: usize,
    ) -> Result<SubstitutionResult>;

    /// Resolver name for logs.
    fn name(&self) -> &'static str;
}

/// Canonical graph key for `ingredient`, rejecting blanks and zero limits.
pub(crate) fn lookup_key(ingredient: &str, top_k: usize) -> Result<String> {
    if top_k == 0 {
        return Err(EngineError::invalid("top_k must be >= 1"));
    }
    let key = normalize(ingredient);
    if key.is_empty() {
        return Err(EngineError::invalid("ingredient must not be empty"));
    }
    Ok(key)
}

/// Clamp a graph score to [0, 1], warning when the stored value was outside it.
pub(crate) fn checked_score(name: &str, score: f64) -> f64 {
    let clamped = clamp_unit(score);
    if clamped != score {
        tracing::warn!(substitute = name, score, "Malformed substitute score, clamping");
    }
    clamped
}
