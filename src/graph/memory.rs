//! In-memory substitution graph for fixtures and CSV edge lists.

use crate::graph::{normalize_context, Cooccurrence, GraphStore};
use crate::normalize::normalize;
use crate::types::{Result, SubstituteEdge};
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Graph held in hash maps. Node names are normalized on insert.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    /// ingredient -> outgoing SUBSTITUTES_WITH edges
    edges: HashMap<String, Vec<SubstituteEdge>>,
    /// recipe -> distinct ingredients (HAS_INGREDIENT)
    recipes: Vec<BTreeSet<String>>,
    /// ingredient -> recipes containing it
    containing: HashMap<String, Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    ingredient: String,
    substitute: String,
    score: f64,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    recipe: String,
    ingredient: String,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a SUBSTITUTES_WITH edge.
    pub fn add_substitute(&mut self, from: &str, to: &str, score: f64, context: Option<&str>) {
        self.edges
            .entry(normalize(from))
            .or_default()
            .push(SubstituteEdge {
                name: normalize(to),
                score,
                context: normalize_context(context),
            });
    }

    /// Add a recipe node with HAS_INGREDIENT edges to `ingredients`.
    pub fn add_recipe<I, S>(&mut self, ingredients: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: BTreeSet<String> = ingredients
            .into_iter()
            .map(|i| normalize(i.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        let id = self.recipes.len();
        for key in &keys {
            self.containing.entry(key.clone()).or_default().push(id);
        }
        self.recipes.push(keys);
    }

    /// Load edge lists exported from the graph.
    ///
    /// # Arguments
    ///
    /// * `substitutes` - CSV with `ingredient,substitute,score,context`
    /// * `recipe_ingredients` - optional CSV with `recipe,ingredient` rows
    ///
    /// # Errors
    ///
    /// Returns `EngineError::CsvError` on malformed rows
    pub fn from_csv<P: AsRef<Path>>(substitutes: P, recipe_ingredients: Option<P>) -> Result<Self> {
        let mut graph = Self::new();

        let mut reader = csv::Reader::from_path(substitutes.as_ref())?;
        let mut edges = 0usize;
        for row in reader.deserialize::<EdgeRow>() {
            let row = row?;
            graph.add_substitute(&row.ingredient, &row.substitute, row.score, row.context.as_deref());
            edges += 1;
        }

        if let Some(path) = recipe_ingredients {
            // Group rows by recipe key, keeping file order of first appearance
            let mut order: Vec<String> = Vec::new();
            let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for row in csv::Reader::from_path(path.as_ref())?.deserialize::<MembershipRow>() {
                let row = row?;
                let entry = members.entry(row.recipe.clone()).or_insert_with(|| {
                    order.push(row.recipe.clone());
                    Vec::new()
                });
                entry.push(row.ingredient);
            }
            for recipe in order {
                if let Some(ingredients) = members.remove(&recipe) {
                    graph.add_recipe(ingredients);
                }
            }
        }

        tracing::info!(edges, recipes = graph.recipes.len(), "Loaded substitution graph");
        Ok(graph)
    }
}

fn by_score_then_name(a: &SubstituteEdge, b: &SubstituteEdge) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.name.cmp(&b.name))
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn substitutes(
        &self,
        ingredient: &str,
        context: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SubstituteEdge>> {
        let Some(edges) = self.edges.get(ingredient) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<SubstituteEdge> = match normalize_context(context) {
            Some(context) => edges
                .iter()
                .filter(|e| e.context.as_deref() == Some(context.as_str()))
                .cloned()
                .collect(),
            None => {
                let mut best: HashMap<&str, f64> = HashMap::new();
                for edge in edges {
                    let score = best.entry(edge.name.as_str()).or_insert(edge.score);
                    if edge.score > *score {
                        *score = edge.score;
                    }
                }
                best.into_iter()
                    .map(|(name, score)| SubstituteEdge {
                        name: name.to_string(),
                        score,
                        context: None,
                    })
                    .collect()
            }
        };

        rows.sort_by(by_score_then_name);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn cooccurrences(&self, ingredient: &str, limit: usize) -> Result<Vec<Cooccurrence>> {
        let Some(recipe_ids) = self.containing.get(ingredient) else {
            return Ok(Vec::new());
        };

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for &id in recipe_ids {
            for other in &self.recipes[id] {
                if other != ingredient {
                    *counts.entry(other.as_str()).or_default() += 1;
                }
            }
        }

        let mut rows: Vec<Cooccurrence> = counts
            .into_iter()
            .map(|(name, frequency)| Cooccurrence {
                name: name.to_string(),
                frequency,
            })
            .collect();
        rows.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.name.cmp(&b.name)));
        rows.truncate(limit);
        Ok(rows)
    }

    fn system(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn butter_graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_substitute("butter", "margarine", 0.92, Some("baking"));
        graph.add_substitute("butter", "oil", 0.60, None);
        graph.add_substitute("butter", "Margarine", 0.80, Some("frying"));
        graph.add_substitute("butter", "ghee", 0.80, None);
        graph
    }

    #[tokio::test]
    async fn test_context_filter() {
        let graph = butter_graph();
        let rows = graph.substitutes("butter", Some("Baking"), 5).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "margarine");
        assert_eq!(rows[0].context.as_deref(), Some("baking"));
    }

    #[tokio::test]
    async fn test_all_edges_best_score_per_name() {
        let graph = butter_graph();
        let rows = graph.substitutes("butter", None, 5).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.score)).collect();

        assert_eq!(names, vec![("margarine", 0.92), ("ghee", 0.80), ("oil", 0.60)]);
        assert!(rows.iter().all(|r| r.context.is_none()));

        let limited = graph.substitutes("butter", None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_empty() {
        let graph = butter_graph();
        assert!(graph.substitutes("saffron", None, 5).await.unwrap().is_empty());
        assert!(graph.cooccurrences("saffron", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cooccurrence_counts_distinct_recipes() {
        let mut graph = MemoryGraph::new();
        graph.add_recipe(["butter", "flour", "sugar", "eggs"]);
        graph.add_recipe(["butter", "flour", "flour"]);
        graph.add_recipe(["butter", "egg"]);
        graph.add_recipe(["flour", "water"]);

        let rows = graph.cooccurrences("butter", 10).await.unwrap();
        assert_eq!(
            rows,
            vec![
                Cooccurrence { name: "egg".into(), frequency: 2 },
                Cooccurrence { name: "flour".into(), frequency: 2 },
                Cooccurrence { name: "sugar".into(), frequency: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_from_csv() {
        let mut subs = NamedTempFile::new().unwrap();
        writeln!(subs, "ingredient,substitute,score,context").unwrap();
        writeln!(subs, "butter,margarine,0.92,baking").unwrap();
        writeln!(subs, "butter,olive oil,0.6,").unwrap();

        let mut members = NamedTempFile::new().unwrap();
        writeln!(members, "recipe,ingredient").unwrap();
        writeln!(members, "r1,butter").unwrap();
        writeln!(members, "r1,flour").unwrap();
        writeln!(members, "r2,butter").unwrap();
        writeln!(members, "r2,flour").unwrap();

        let graph = MemoryGraph::from_csv(subs.path(), Some(members.path())).unwrap();

        let rows = graph.substitutes("butter", None, 5).await.unwrap();
        assert_eq!(rows[1].name, "olive_oil");
        let cooc = graph.cooccurrences("flour", 5).await.unwrap();
        assert_eq!(cooc, vec![Cooccurrence { name: "butter".into(), frequency: 2 }]);
    }
}
