//! Neo4j adapter over bolt (`neo4rs`).
//!
//! All queries are parameterized; ingredient names and contexts never reach
//! the Cypher text.

use crate::graph::{normalize_context, Cooccurrence, GraphStore};
use crate::types::{Dependency, EngineError, Result, SubstituteEdge};
use async_trait::async_trait;
use neo4rs::{query, Graph, Query, Row};

const SUBSTITUTES_IN_CONTEXT: &str = "\
MATCH (i:Ingredient {name: $name})-[r:SUBSTITUTES_WITH]->(s:Ingredient)
WHERE toLower(r.context) = $context
RETURN s.name AS name, toFloat(r.score) AS score, r.context AS context
ORDER BY score DESC, name ASC
LIMIT $limit";

const SUBSTITUTES_ANY_CONTEXT: &str = "\
MATCH (i:Ingredient {name: $name})-[r:SUBSTITUTES_WITH]->(s:Ingredient)
RETURN s.name AS name, max(toFloat(r.score)) AS score
ORDER BY score DESC, name ASC
LIMIT $limit";

const COOCCURRENCES: &str = "\
MATCH (i:Ingredient {name: $name})<-[:HAS_INGREDIENT]-(r:Recipe)-[:HAS_INGREDIENT]->(o:Ingredient)
WHERE o.name <> $name
RETURN o.name AS name, count(DISTINCT r) AS frequency
ORDER BY frequency DESC, name ASC
LIMIT $limit";

/// Substitution graph stored in Neo4j.
#[derive(Clone)]
pub struct Neo4jGraph {
    graph: Graph,
}

impl Neo4jGraph {
    /// Connect to `uri` (e.g. `neo4j://localhost:7687`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Unavailable` (dependency `Graph`) if the server
    /// cannot be reached or rejects the credentials
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        tracing::info!(uri, "Connected to substitution graph");
        Ok(Self { graph })
    }

    /// Wrap an existing connection pool.
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    async fn fetch(&self, q: Query) -> Result<Vec<Row>> {
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

fn column<T>(row: &Row, key: &str) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    row.get::<T>(key).map_err(|e| {
        EngineError::unavailable(Dependency::Graph, format!("Bad column '{}': {}", key, e))
    })
}

/// Cypher for a substitutes lookup and the normalized context it binds, if any.
fn substitutes_query(context: Option<&str>) -> (&'static str, Option<String>) {
    match normalize_context(context) {
        Some(context) => (SUBSTITUTES_IN_CONTEXT, Some(context)),
        None => (SUBSTITUTES_ANY_CONTEXT, None),
    }
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn substitutes(
        &self,
        ingredient: &str,
        context: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SubstituteEdge>> {
        let (cypher, context) = substitutes_query(context);
        let contextual = context.is_some();
        let mut q = query(cypher)
            .param("name", ingredient)
            .param("limit", limit_param(limit));
        if let Some(context) = context {
            q = q.param("context", context);
        }

        self.fetch(q)
            .await?
            .iter()
            .map(|row| {
                Ok(SubstituteEdge {
                    name: column(row, "name")?,
                    score: column(row, "score")?,
                    context: if contextual {
                        column::<Option<String>>(row, "context")?.map(|c| c.to_lowercase())
                    } else {
                        None
                    },
                })
            })
            .collect()
    }

    async fn cooccurrences(&self, ingredient: &str, limit: usize) -> Result<Vec<Cooccurrence>> {
        let q = query(COOCCURRENCES)
            .param("name", ingredient)
            .param("limit", limit_param(limit));

        self.fetch(q)
            .await?
            .iter()
            .map(|row| {
                let frequency: i64 = column(row, "frequency")?;
                Ok(Cooccurrence {
                    name: column(row, "name")?,
                    frequency: u64::try_from(frequency).unwrap_or(0),
                })
            })
            .collect()
    }

    fn system(&self) -> &'static str {
        "neo4j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_are_parameterized() {
        for cypher in [SUBSTITUTES_IN_CONTEXT, SUBSTITUTES_ANY_CONTEXT, COOCCURRENCES] {
            assert!(cypher.contains("$name"));
            assert!(cypher.contains("LIMIT $limit"));
        }
        assert!(SUBSTITUTES_IN_CONTEXT.contains("$context"));
    }

    #[test]
    fn test_context_branch_follows_normalized_context() {
        assert_eq!(
            substitutes_query(Some(" Baking ")),
            (SUBSTITUTES_IN_CONTEXT, Some("baking".to_string()))
        );
        for blank in [None, Some(""), Some("   ")] {
            assert_eq!(substitutes_query(blank), (SUBSTITUTES_ANY_CONTEXT, None));
        }
    }

    #[test]
    fn test_limit_param() {
        assert_eq!(limit_param(10), 10);
    }
}
