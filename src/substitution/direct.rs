//! Direct SUBSTITUTES_WITH edge resolver with context fallback.

use crate::graph::{normalize_context, GraphStore};
use crate::otel::{record_store_rows, store_span};
use crate::substitution::{checked_score, lookup_key, Resolver};
use crate::types::{
    Dependency, EngineError, Result, Substitute, SubstituteEdge, SubstituteSource,
    SubstitutionResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

/// Reads scored substitute edges.
///
/// With a context, edges for that context win. If there are none (or no
/// context was given) every edge of the ingredient is used instead and
/// `matched_context` is false.
#[derive(Clone)]
pub struct DirectResolver {
    graph: Arc<dyn GraphStore>,
}

impl DirectResolver {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    async fn edges(
        &self,
        key: &str,
        context: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SubstituteEdge>> {
        let span = store_span(Dependency::Graph, self.graph.system(), "substitutes");
        async {
            let rows = self.graph.substitutes(key, context, top_k).await?;
            record_store_rows(rows.len());
            Ok::<_, EngineError>(rows)
        }
        .instrument(span)
        .await
    }
}

fn to_substitutes(edges: Vec<SubstituteEdge>, source: SubstituteSource) -> Vec<Substitute> {
    edges
        .into_iter()
        .map(|edge| Substitute {
            score: checked_score(&edge.name, edge.score),
            context: match source {
                SubstituteSource::Direct => edge.context,
                _ => None,
            },
            name: edge.name,
            source,
        })
        .collect()
}

#[async_trait]
impl Resolver for DirectResolver {
    async fn resolve(
        &self,
        ingredient: &str,
        context: Option<&str>,
        top_k: usize,
    ) -> Result<SubstitutionResult> {
        let key = lookup_key(ingredient, top_k)?;

        if let Some(context) = normalize_context(context) {
            let edges = self.edges(&key, Some(&context), top_k).await?;
            if !edges.is_empty() {
                return Ok(SubstitutionResult {
                    matched_context: true,
                    substitutes: to_substitutes(edges, SubstituteSource::Direct),
                });
            }
            tracing::debug!(ingredient = %key, context = %context, "No edges for context, falling back");
        }

        let edges = self.edges(&key, None, top_k).await?;
        Ok(SubstitutionResult {
            matched_context: false,
            substitutes: to_substitutes(edges, SubstituteSource::Fallback),
        })
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;

    fn resolver() -> DirectResolver {
        let mut graph = MemoryGraph::new();
        graph.add_substitute("butter", "margarine", 0.92, Some("baking"));
        graph.add_substitute("butter", "oil", 0.60, None);
        graph.add_substitute("eggs", "flaxseed", 0.70, None);
        graph.add_substitute("eggs", "applesauce", 1.40, Some("vegan"));
        DirectResolver::new(Arc::new(graph))
    }

    #[tokio::test]
    async fn test_context_match_skips_fallback() {
        let result = resolver().resolve("butter", Some("baking"), 2).await.unwrap();

        assert!(result.matched_context);
        assert_eq!(
            result.substitutes,
            vec![Substitute {
                name: "margarine".to_string(),
                score: 0.92,
                context: Some("baking".to_string()),
                source: SubstituteSource::Direct,
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_context_falls_back() {
        let result = resolver().resolve("Eggs", Some("baking"), 5).await.unwrap();

        assert!(!result.matched_context);
        let names: Vec<_> = result.substitutes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["applesauce", "flaxseed"]);
        assert!(result
            .substitutes
            .iter()
            .all(|s| s.source == SubstituteSource::Fallback && s.context.is_none()));
    }

    #[tokio::test]
    async fn test_no_context_uses_all_edges() {
        let result = resolver().resolve("butter", None, 5).await.unwrap();
        assert!(!result.matched_context);
        assert_eq!(result.substitutes.len(), 2);
        assert_eq!(result.substitutes[0].name, "margarine");
    }

    #[tokio::test]
    async fn test_scores_clamped() {
        let result = resolver().resolve("egg", Some("vegan"), 5).await.unwrap();
        assert_eq!(result.substitutes[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_empty() {
        let result = resolver().resolve("saffron", Some("baking"), 5).await.unwrap();
        assert_eq!(result, SubstitutionResult::default());
    }

    #[tokio::test]
    async fn test_blank_ingredient_rejected() {
        let err = resolver().resolve("   ", None, 5).await.unwrap_err();
        assert!(err.is_input_error());
        assert!(resolver().resolve("butter", None, 0).await.unwrap_err().is_input_error());
    }
}
