//! RocksDB-backed recipe store.
//!
//! # Column families
//!
//! | CF | Key | Value |
//! |----|-----|-------|
//! | `recipes` | `RecipeRef` (u32 big-endian) | recipe JSON |
//! | `title_index` | lower-cased title | `RecipeRef` (u32 big-endian) |

use crate::storage::{title_key, RecipeStore};
use crate::types::{Dependency, EngineError, Recipe, RecipeRef, Result};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Recipe records
pub const CF_RECIPES: &str = "recipes";

/// Title lookup index
pub const CF_TITLE_INDEX: &str = "title_index";

/// Recipe store on RocksDB.
#[derive(Clone)]
pub struct RocksRecipeStore {
    db: Arc<DB>,
}

impl RocksRecipeStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Read-heavy, point lookups only
        opts.set_level_compaction_dynamic_level_bytes(true);
        opts.set_max_background_jobs(2);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RECIPES, Options::default()),
            ColumnFamilyDescriptor::new(CF_TITLE_INDEX, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)?;
        tracing::info!(path = %path.as_ref().display(), "Opened recipe store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Get column family handle.
    fn cf_handle(&self, cf_name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| EngineError::InternalError(format!("CF not found: {}", cf_name)))
    }

    /// Queue deletes for every key in `cf` onto `batch`.
    fn clear_cf(&self, batch: &mut WriteBatch, cf: &ColumnFamily) -> Result<usize> {
        let mut cleared = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(cf, key);
            cleared += 1;
        }
        Ok(cleared)
    }

    /// Replace the store contents with `recipes` (rows `0..n`) in one atomic batch.
    ///
    /// Rows and titles from earlier imports are removed. The title index keeps
    /// the first recipe per title.
    ///
    /// # Returns
    ///
    /// Number of recipes written
    pub fn import(&self, recipes: &[Recipe]) -> Result<usize> {
        if recipes.len() > u32::MAX as usize {
            return Err(EngineError::invalid(format!("Too many recipes: {}", recipes.len())));
        }

        let recipes_cf = self.cf_handle(CF_RECIPES)?;
        let titles_cf = self.cf_handle(CF_TITLE_INDEX)?;

        let mut batch = WriteBatch::default();
        let stale = self.clear_cf(&mut batch, recipes_cf)?;
        self.clear_cf(&mut batch, titles_cf)?;

        let mut seen_titles = HashSet::new();
        for (row, recipe) in recipes.iter().enumerate() {
            let recipe_ref = RecipeRef(row as u32);
            batch.put_cf(recipes_cf, recipe_ref.to_key(), serde_json::to_vec(recipe)?);

            let title = title_key(&recipe.title);
            if seen_titles.insert(title.clone()) {
                batch.put_cf(titles_cf, title.as_bytes(), recipe_ref.to_key());
            }
        }

        self.db.write(batch)?;
        tracing::info!(recipes = recipes.len(), replaced = stale, "Imported recipes");
        Ok(recipes.len())
    }
}

impl RecipeStore for RocksRecipeStore {
    fn get_recipe(&self, recipe_ref: RecipeRef) -> Result<Recipe> {
        let cf = self.cf_handle(CF_RECIPES)?;
        let bytes = self
            .db
            .get_cf(cf, recipe_ref.to_key())?
            .ok_or(EngineError::RecipeNotFound(recipe_ref))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::unavailable(
                Dependency::RecipeStore,
                format!("Corrupt record {}: {}", recipe_ref, e),
            )
        })
    }

    fn find_by_title(&self, title: &str) -> Result<Option<(RecipeRef, Recipe)>> {
        let cf = self.cf_handle(CF_TITLE_INDEX)?;
        let Some(bytes) = self.db.get_cf(cf, title_key(title).as_bytes())? else {
            return Ok(None);
        };
        let recipe_ref = RecipeRef::from_key(&bytes).ok_or_else(|| {
            EngineError::unavailable(Dependency::RecipeStore, "Corrupt title index entry")
        })?;
        Ok(Some((recipe_ref, self.get_recipe(recipe_ref)?)))
    }

    fn system(&self) -> &'static str {
        "rocksdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recipes() -> Vec<Recipe> {
        vec![
            Recipe::new("10", "Pancakes", vec!["egg".into(), "flour".into()]),
            Recipe::new("11", "Pancakes", vec!["banana".into()]),
            Recipe::new("12", "French Toast", vec!["bread".into(), "egg".into()]),
        ]
    }

    #[test]
    fn test_import_and_get() {
        let dir = tempdir().unwrap();
        let store = RocksRecipeStore::open(dir.path()).unwrap();

        assert_eq!(store.import(&recipes()).unwrap(), 3);
        assert_eq!(store.get_recipe(RecipeRef(2)).unwrap().title, "French Toast");
        assert!(matches!(
            store.get_recipe(RecipeRef(3)),
            Err(EngineError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_title_lookup_first_wins() {
        let dir = tempdir().unwrap();
        let store = RocksRecipeStore::open(dir.path()).unwrap();
        store.import(&recipes()).unwrap();

        let (row, recipe) = store.find_by_title("pancakes").unwrap().unwrap();
        assert_eq!(row, RecipeRef(0));
        assert_eq!(recipe.recipe_id, "10");
        assert!(store.find_by_title("Waffles").unwrap().is_none());
    }

    #[test]
    fn test_reimport_replaces_rows_and_titles() {
        let dir = tempdir().unwrap();
        let store = RocksRecipeStore::open(dir.path()).unwrap();
        store.import(&recipes()).unwrap();
        store
            .import(&[Recipe::new("20", "Waffles", vec!["egg".into(), "milk".into()])])
            .unwrap();

        assert!(store.find_by_title("pancakes").unwrap().is_none());
        assert!(store.find_by_title("French Toast").unwrap().is_none());
        let (row, recipe) = store.find_by_title("waffles").unwrap().unwrap();
        assert_eq!(row, RecipeRef(0));
        assert_eq!(recipe.recipe_id, "20");
        assert!(matches!(
            store.get_recipe(RecipeRef(2)),
            Err(EngineError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempdir().unwrap();
        {
            let store = RocksRecipeStore::open(dir.path()).unwrap();
            store.import(&recipes()).unwrap();
        }
        let store = RocksRecipeStore::open(dir.path()).unwrap();
        assert_eq!(store.get_recipe(RecipeRef(0)).unwrap().recipe_id, "10");
    }
}
