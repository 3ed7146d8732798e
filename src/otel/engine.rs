//! Engine operation instrumentation.

use tracing::{field, span, Level, Span};

/// Public engine operations (maps to `engine.operation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOperation {
    SuggestRecipes,
    GetSubstitutes,
    PantrySubstitutions,
    RecipeDetails,
}

impl EngineOperation {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuggestRecipes => "suggest_recipes",
            Self::GetSubstitutes => "get_substitutes",
            Self::PantrySubstitutions => "pantry_substitutions",
            Self::RecipeDetails => "recipe_details",
        }
    }
}

/// Create an engine operation span.
///
/// # Arguments
///
/// * `operation` - Engine operation
/// * `target` - Request subject (ingredient, title, joined query)
///
/// # Returns
///
/// INFO span with `engine.candidates` and `engine.returned` left empty for
/// [`record_result_metrics`]
pub fn engine_span(operation: EngineOperation, target: &str) -> Span {
    span!(
        Level::INFO,
        "engine",
        otel.name = format!("{} {}", operation.as_str(), target),
        otel.kind = "internal",
        engine.operation = operation.as_str(),
        engine.candidates = field::Empty,
        engine.returned = field::Empty,
    )
}

/// Record candidate and result counts on the current span.
///
/// # Example
///
/// ```rust,ignore
/// let ranked = rank(candidates)?;
/// record_result_metrics(pool_len, ranked.len());
/// ```
pub fn record_result_metrics(candidates: usize, returned: usize) {
    let span = Span::current();
    span.record("engine.candidates", candidates);
    span.record("engine.returned", returned);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(EngineOperation::SuggestRecipes.as_str(), "suggest_recipes");
        assert_eq!(EngineOperation::PantrySubstitutions.as_str(), "pantry_substitutions");
    }

    #[test]
    fn test_engine_span_creation() {
        let span = engine_span(EngineOperation::GetSubstitutes, "butter");
        // Disabled without a subscriber; metadata is still attached when enabled
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "engine");
        }
    }
}
