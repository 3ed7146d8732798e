//! Core types for the recipe engine.

pub mod error;
pub mod recipe;
pub mod substitution;

pub use error::{Dependency, EngineError, Result};
pub use recipe::{Neighbor, RankedRecipe, Recipe, RecipeRef, SuggestParams};
pub use substitution::{
    MissingIngredient, PantryMatch, PantryReport, Substitute, SubstituteEdge, SubstituteParams,
    SubstituteSource, SubstitutionResult,
};

/// Clamp a score into [0, 1]; NaN floors to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Round to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.3), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(0.92), 0.92);
    }
}
