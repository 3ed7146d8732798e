//! Co-occurrence resolver: affinity from shared-recipe frequency.

use crate::graph::GraphStore;
use crate::otel::{record_store_rows, store_span};
use crate::substitution::{lookup_key, Resolver};
use crate::types::{
    Dependency, EngineError, Result, Substitute, SubstituteSource, SubstitutionResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

/// Default frequency ceiling: 50 shared recipes score 1.0.
pub const DEFAULT_COOCCURRENCE_CEILING: f64 = 50.0;

/// Scores other ingredients by how many recipes they share with the query.
///
/// `score = min(frequency / ceiling, 1.0)`. The ceiling is a fixed calibration
/// constant, never derived from the data at query time.
#[derive(Clone)]
pub struct CooccurrenceResolver {
    graph: Arc<dyn GraphStore>,
    ceiling: f64,
}

impl CooccurrenceResolver {
    /// # Errors
    ///
    /// Returns `EngineError::ConfigError` unless `ceiling` is finite and > 0
    pub fn new(graph: Arc<dyn GraphStore>, ceiling: f64) -> Result<Self> {
        if !(ceiling.is_finite() && ceiling > 0.0) {
            return Err(EngineError::ConfigError(format!(
                "Co-occurrence ceiling must be > 0, got {}",
                ceiling
            )));
        }
        Ok(Self { graph, ceiling })
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    fn score(&self, frequency: u64) -> f64 {
        (frequency as f64 / self.ceiling).min(1.0)
    }
}

#[async_trait]
impl Resolver for CooccurrenceResolver {
    async fn resolve(
        &self,
        ingredient: &str,
        _context: Option<&str>,
        top_k: usize,
    ) -> Result<SubstitutionResult> {
        let key = lookup_key(ingredient, top_k)?;

        let span = store_span(Dependency::Graph, self.graph.system(), "cooccurrences");
        let rows = async {
            let rows = self.graph.cooccurrences(&key, top_k).await?;
            record_store_rows(rows.len());
            Ok::<_, EngineError>(rows)
        }
        .instrument(span)
        .await?;

        Ok(SubstitutionResult {
            matched_context: false,
            substitutes: rows
                .into_iter()
                .map(|row| Substitute {
                    score: self.score(row.frequency),
                    name: row.name,
                    context: None,
                    source: SubstituteSource::Cooccurrence,
                })
                .collect(),
        })
    }

    fn name(&self) -> &'static str {
        "cooccurrence"
    }
}
