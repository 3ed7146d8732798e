//! Substitution graph rows and ranked substitute types.

use crate::types::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outgoing SUBSTITUTES_WITH edge as read from the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteEdge {
    /// Canonical name of the substitute ingredient
    pub name: String,

    /// Edge score in [0, 1]
    pub score: f64,

    /// Usage context label (e.g. "baking"); `None` for general edges
    pub context: Option<String>,
}

/// Which resolver produced a substitute row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstituteSource {
    /// Context-specific SUBSTITUTES_WITH edge
    Direct,
    /// Context-free SUBSTITUTES_WITH edge (no context given or none matched)
    Fallback,
    /// Shared-recipe frequency
    Cooccurrence,
    /// Weighted blend of direct and co-occurrence scores
    Hybrid,
}

impl SubstituteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fallback => "fallback",
            Self::Cooccurrence => "cooccurrence",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SubstituteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked substitute returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitute {
    pub name: String,

    /// Score in [0, 1]
    pub score: f64,

    /// Set only when a context-specific direct edge contributed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    pub source: SubstituteSource,
}

/// Ranked substitutes plus whether the requested context matched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubstitutionResult {
    pub matched_context: bool,
    pub substitutes: Vec<Substitute>,
}

/// Parameters for `get_substitutes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteParams {
    /// Optional usage context
    pub context: Option<String>,

    /// Blend direct and co-occurrence resolvers
    pub hybrid: bool,

    /// Number of substitutes to return (>= 1)
    pub top_k: usize,

    /// Weight on the direct resolver in [0, 1]
    pub alpha: f64,
}

impl Default for SubstituteParams {
    fn default() -> Self {
        Self {
            context: None,
            hybrid: true,
            top_k: 5,
            alpha: 0.9,
        }
    }
}

impl SubstituteParams {
    /// Reject `top_k == 0`, and `alpha` outside [0, 1] when blending.
    ///
    /// Direct-only requests never read `alpha`.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(EngineError::invalid("top_k must be >= 1"));
        }
        if self.hybrid && !(0.0..=1.0).contains(&self.alpha) {
            return Err(EngineError::invalid(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Pantry status of a recipe ingredient the user already has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryMatch {
    pub ingredient: String,
    /// Pantry item that covered the ingredient
    pub matched_as: String,
}

/// A recipe ingredient missing from the pantry, with substitutes split by availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingIngredient {
    pub ingredient: String,
    pub pantry_substitutes: Vec<Substitute>,
    pub other_substitutes: Vec<Substitute>,
}

/// Pantry coverage report for one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryReport {
    pub have: Vec<PantryMatch>,
    pub missing: Vec<MissingIngredient>,
    pub total_ingredients: usize,
    pub have_count: usize,
    pub missing_count: usize,
    /// `have_count / total_ingredients`, rounded to 2 decimals
    pub coverage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert!(SubstituteParams::default().validate().is_ok());
        let zero = SubstituteParams { top_k: 0, ..Default::default() };
        assert!(zero.validate().unwrap_err().is_input_error());
        let alpha = SubstituteParams { alpha: -0.1, ..Default::default() };
        assert!(alpha.validate().unwrap_err().is_input_error());

        let direct_only = SubstituteParams {
            alpha: -0.1,
            hybrid: false,
            ..Default::default()
        };
        assert!(direct_only.validate().is_ok());
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let row = Substitute {
            name: "margarine".to_string(),
            score: 0.92,
            context: None,
            source: SubstituteSource::Cooccurrence,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["source"], "cooccurrence");
        assert!(json.get("context").is_none());
    }
}
