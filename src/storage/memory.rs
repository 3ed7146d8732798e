//! In-memory recipe store.

use crate::storage::{import, title_key, RecipeStore};
use crate::types::{EngineError, Recipe, RecipeRef, Result};
use std::collections::HashMap;
use std::path::Path;

/// `Vec`-backed recipe store; position is the row reference.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecipeStore {
    recipes: Vec<Recipe>,
    titles: HashMap<String, RecipeRef>,
}

impl MemoryRecipeStore {
    /// Create store; `recipes[n]` becomes `RecipeRef(n)`.
    pub fn from_recipes(recipes: Vec<Recipe>) -> Self {
        let mut titles = HashMap::with_capacity(recipes.len());
        for (row, recipe) in recipes.iter().enumerate() {
            titles
                .entry(title_key(&recipe.title))
                .or_insert(RecipeRef(row as u32));
        }
        Self { recipes, titles }
    }

    /// Load a recipe metadata CSV export.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_recipes(import::read_recipes(path)?))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeStore for MemoryRecipeStore {
    fn get_recipe(&self, recipe_ref: RecipeRef) -> Result<Recipe> {
        self.recipes
            .get(recipe_ref.0 as usize)
            .cloned()
            .ok_or(EngineError::RecipeNotFound(recipe_ref))
    }

    fn find_by_title(&self, title: &str) -> Result<Option<(RecipeRef, Recipe)>> {
        Ok(self
            .titles
            .get(&title_key(title))
            .and_then(|r| self.recipes.get(r.0 as usize).map(|recipe| (*r, recipe.clone()))))
    }

    fn system(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryRecipeStore {
        MemoryRecipeStore::from_recipes(vec![
            Recipe::new("1", "Pancakes", vec!["egg".into(), "flour".into()]),
            Recipe::new("2", "Omelette", vec!["egg".into(), "butter".into()]),
            Recipe::new("3", "pancakes", vec!["banana".into()]),
        ])
    }

    #[test]
    fn test_get_recipe() {
        let store = store();
        assert_eq!(store.get_recipe(RecipeRef(1)).unwrap().title, "Omelette");
        assert!(matches!(
            store.get_recipe(RecipeRef(7)),
            Err(EngineError::RecipeNotFound(RecipeRef(7)))
        ));
    }

    #[test]
    fn test_find_by_title_first_wins() {
        let store = store();
        let (row, recipe) = store.find_by_title("  PANCAKES ").unwrap().unwrap();
        assert_eq!(row, RecipeRef(0));
        assert_eq!(recipe.recipe_id, "1");
        assert!(store.find_by_title("waffles").unwrap().is_none());
    }
}
