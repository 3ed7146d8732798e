//! Substitution property graph.
//!
//! Nodes are `Ingredient {name}` and `Recipe`; edges are
//! `SUBSTITUTES_WITH {score, context}` between ingredients and
//! `HAS_INGREDIENT` from recipe to ingredient. `SIMILAR_TO` edges may exist
//! but nothing here reads them.
//!
//! Ingredient names passed to a [`GraphStore`] are already canonical keys
//! (see [`crate::normalize`]); contexts are trimmed and lower-cased.

mod memory;
mod neo4j;

pub use memory::MemoryGraph;
pub use neo4j::Neo4jGraph;

use crate::types::{Result, SubstituteEdge};
use async_trait::async_trait;

/// Ingredient sharing recipes with the query ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooccurrence {
    pub name: String,
    /// Number of distinct recipes containing both ingredients
    pub frequency: u64,
}

/// Read-only substitution graph port.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Outgoing SUBSTITUTES_WITH edges of `ingredient`.
    ///
    /// With `Some(context)`, only edges carrying that context. With `None`,
    /// every edge regardless of context, one row per substitute holding its
    /// best score, `context` unset. Ordered by score descending then name
    /// ascending, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Unavailable` (dependency `Graph`) on store failure
    async fn substitutes(
        &self,
        ingredient: &str,
        context: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SubstituteEdge>>;

    /// Ingredients appearing in recipes that contain `ingredient`, excluding
    /// itself. Ordered by frequency descending then name ascending, at most
    /// `limit` rows.
    async fn cooccurrences(&self, ingredient: &str, limit: usize) -> Result<Vec<Cooccurrence>>;

    /// Backend name used in spans (`memory`, `neo4j`).
    fn system(&self) -> &'static str;
}

/// Canonical context label: trimmed, lower-cased; blank means no context.
pub fn normalize_context(context: Option<&str>) -> Option<String> {
    context
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_context() {
        assert_eq!(normalize_context(Some(" Baking ")), Some("baking".to_string()));
        assert_eq!(normalize_context(Some("   ")), None);
        assert_eq!(normalize_context(None), None);
    }
}
