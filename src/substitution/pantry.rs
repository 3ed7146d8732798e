//! Pantry-aware substitution: what a recipe needs that the pantry lacks.

use crate::normalize::{covers, normalize};
use crate::substitution::HybridBlender;
use crate::types::{
    EngineError, MissingIngredient, PantryMatch, PantryReport, Result, Substitute,
};

/// Pantry item whose canonical tokens cover `ingredient`, if any.
fn pantry_match<'a>(pantry: &'a [(String, String)], ingredient: &str) -> Option<&'a str> {
    let key = normalize(ingredient);
    pantry
        .iter()
        .find(|(_, pantry_key)| covers(pantry_key, &key))
        .map(|(surface, _)| surface.as_str())
}

/// Classify `recipe_ingredients` against `pantry` and find substitutes for the gaps.
///
/// A pantry item covers an ingredient when its canonical tokens appear as a
/// contiguous run in the ingredient's (pantry `egg` covers `large eggs`). For
/// each missing ingredient the blender is asked for `top_k * 3` context-free
/// candidates, split into those the pantry covers and the rest, each list cut
/// to `top_k`.
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for `top_k == 0` or `alpha` outside
/// [0, 1]; resolver errors propagate and no partial report is returned
pub async fn pantry_report(
    blender: &HybridBlender,
    recipe_ingredients: &[String],
    pantry: &[String],
    top_k: usize,
    alpha: f64,
) -> Result<PantryReport> {
    if top_k == 0 {
        return Err(EngineError::invalid("top_k must be >= 1"));
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(EngineError::invalid(format!("alpha must be in [0, 1], got {}", alpha)));
    }

    let pantry: Vec<(String, String)> = pantry
        .iter()
        .map(|p| (p.trim().to_string(), normalize(p)))
        .filter(|(_, key)| !key.is_empty())
        .collect();

    let ingredients: Vec<&str> = recipe_ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !normalize(i).is_empty())
        .collect();

    let mut have = Vec::new();
    let mut missing = Vec::new();
    for ingredient in &ingredients {
        if let Some(matched_as) = pantry_match(&pantry, ingredient) {
            have.push(PantryMatch {
                ingredient: ingredient.to_string(),
                matched_as: matched_as.to_string(),
            });
            continue;
        }

        let candidates = blender
            .blend(ingredient, None, top_k.saturating_mul(3), alpha)
            .await?;
        let (mut in_pantry, mut other): (Vec<Substitute>, Vec<Substitute>) = candidates
            .substitutes
            .into_iter()
            .partition(|s| pantry_match(&pantry, &s.name).is_some());
        in_pantry.truncate(top_k);
        other.truncate(top_k);

        missing.push(MissingIngredient {
            ingredient: ingredient.to_string(),
            pantry_substitutes: in_pantry,
            other_substitutes: other,
        });
    }

    let total = ingredients.len();
    let have_count = have.len();
    let coverage = (have_count as f64 / total.max(1) as f64 * 100.0).round() / 100.0;
    tracing::info!(total, have = have_count, coverage, "Pantry coverage computed");

    Ok(PantryReport {
        have,
        missing,
        total_ingredients: total,
        have_count,
        missing_count: total - have_count,
        coverage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::substitution::{CooccurrenceResolver, DirectResolver};
    use std::sync::Arc;

    fn blender() -> HybridBlender {
        let mut graph = MemoryGraph::new();
        graph.add_substitute("soy sauce", "tamari", 0.91, None);
        graph.add_substitute("soy sauce", "fish sauce", 0.82, None);
        graph.add_substitute("soy sauce", "coconut aminos", 0.75, None);
        graph.add_substitute("buttermilk", "milk", 0.70, Some("baking"));
        let graph = Arc::new(graph);
        HybridBlender::new(
            Arc::new(DirectResolver::new(graph.clone())),
            Arc::new(CooccurrenceResolver::new(graph, 50.0).unwrap()),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_have_and_missing() {
        let report = pantry_report(
            &blender(),
            &strings(&["Large Eggs", "chicken breast", "soy sauce", "buttermilk"]),
            &strings(&["egg", "Chicken", "fish sauce", "whole milk"]),
            1,
            1.0,
        )
        .await
        .unwrap();

        assert_eq!(report.total_ingredients, 4);
        assert_eq!(report.have_count, 2);
        assert_eq!(report.missing_count, 2);
        assert_eq!(report.coverage, 0.5);
        assert_eq!(report.have[0].matched_as, "egg");
        assert_eq!(report.have[1].matched_as, "Chicken");

        let soy = &report.missing[0];
        assert_eq!(soy.ingredient, "soy sauce");
        assert_eq!(soy.pantry_substitutes.len(), 1);
        assert_eq!(soy.pantry_substitutes[0].name, "fish_sauce");
        assert_eq!(soy.other_substitutes.len(), 1);
        assert_eq!(soy.other_substitutes[0].name, "tamari");

        // "milk" is not covered by "whole milk" (pantry tokens must sit inside the ingredient)
        let buttermilk = &report.missing[1];
        assert!(buttermilk.pantry_substitutes.is_empty());
        assert_eq!(buttermilk.other_substitutes[0].name, "milk");
    }

    #[tokio::test]
    async fn test_coverage_rounding() {
        let report = pantry_report(
            &blender(),
            &strings(&["egg", "flour", "sugar"]),
            &strings(&["egg"]),
            3,
            0.9,
        )
        .await
        .unwrap();
        assert_eq!(report.coverage, 0.33);
        assert!(report.missing.iter().all(|m| m.other_substitutes.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_recipe() {
        let report = pantry_report(&blender(), &[], &strings(&["egg"]), 3, 0.9).await.unwrap();
        assert_eq!(report.total_ingredients, 0);
        assert_eq!(report.coverage, 0.0);
    }
}
