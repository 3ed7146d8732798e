//! Recipe metadata store.
//!
//! Maps an index row ([`RecipeRef`]) to its [`Recipe`]. Two adapters:
//! - [`MemoryRecipeStore`]: `Vec`-backed, loaded from a CSV export or fixtures
//! - [`RocksRecipeStore`]: RocksDB column families, shared across processes
//!
//! Loaded once at start-up and read-only afterwards.

pub mod import;
mod memory;
mod rocks;

pub use memory::MemoryRecipeStore;
pub use rocks::{RocksRecipeStore, CF_RECIPES, CF_TITLE_INDEX};

use crate::types::{Recipe, RecipeRef, Result};

/// Recipe metadata lookup port.
///
/// Lookups are synchronous; async callers run them on the blocking pool.
pub trait RecipeStore: Send + Sync {
    /// Fetch the recipe stored under `recipe_ref`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::RecipeNotFound` for unknown rows and
    /// `EngineError::Unavailable` if the backing store fails
    fn get_recipe(&self, recipe_ref: RecipeRef) -> Result<Recipe>;

    /// Case-insensitive exact title lookup. First recipe with the title wins.
    fn find_by_title(&self, title: &str) -> Result<Option<(RecipeRef, Recipe)>>;

    /// Backend name used in spans (`memory`, `rocksdb`).
    fn system(&self) -> &'static str;
}

/// Title index key: trimmed, lower-cased.
pub(crate) fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}
