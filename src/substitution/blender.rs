//! Weighted blend of the direct and co-occurrence resolvers.

use crate::substitution::Resolver;
use crate::types::{
    clamp_unit, round4, EngineError, Result, Substitute, SubstituteSource, SubstitutionResult,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Candidate name with its position and score in each resolver's list.
#[derive(Debug)]
struct Merged<'a> {
    name: &'a str,
    direct: Option<(usize, &'a Substitute)>,
    cooccurrence: Option<(usize, f64)>,
}

/// Combines a direct and a co-occurrence resolver.
///
/// `hybrid = round4(alpha * direct + (1 - alpha) * cooccurrence)`, a missing
/// side counting as 0. At `alpha = 1` only direct candidates are kept and
/// their order is the direct order; at `alpha = 0` likewise for co-occurrence.
/// Ties keep the order of the dominant resolver (direct when `alpha >= 0.5`).
#[derive(Clone)]
pub struct HybridBlender {
    direct: Arc<dyn Resolver>,
    cooccurrence: Arc<dyn Resolver>,
}

impl HybridBlender {
    pub fn new(direct: Arc<dyn Resolver>, cooccurrence: Arc<dyn Resolver>) -> Self {
        Self {
            direct,
            cooccurrence,
        }
    }

    /// Direct resolver on its own (non-hybrid requests).
    pub fn direct(&self) -> &Arc<dyn Resolver> {
        &self.direct
    }

    /// Blend both resolvers for `ingredient`.
    ///
    /// Each resolver is asked for `top_k * 2` candidates so the union has
    /// coverage before truncation; both calls run concurrently.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if `alpha` is outside [0, 1] or
    /// `top_k == 0`; the first resolver error otherwise
    pub async fn blend(
        &self,
        ingredient: &str,
        context: Option<&str>,
        top_k: usize,
        alpha: f64,
    ) -> Result<SubstitutionResult> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(EngineError::invalid(format!("alpha must be in [0, 1], got {}", alpha)));
        }
        if top_k == 0 {
            return Err(EngineError::invalid("top_k must be >= 1"));
        }

        let fetch = top_k.saturating_mul(2);
        let (direct, cooccurrence) = tokio::try_join!(
            self.direct.resolve(ingredient, context, fetch),
            self.cooccurrence.resolve(ingredient, context, fetch),
        )?;

        tracing::debug!(
            direct = direct.substitutes.len(),
            cooccurrence = cooccurrence.substitutes.len(),
            alpha,
            "Blending substitute candidates"
        );

        Ok(SubstitutionResult {
            matched_context: direct.matched_context,
            substitutes: merge(&direct, &cooccurrence, top_k, alpha),
        })
    }
}

/// Union, score, order and truncate two resolver lists.
pub fn merge(
    direct: &SubstitutionResult,
    cooccurrence: &SubstitutionResult,
    top_k: usize,
    alpha: f64,
) -> Vec<Substitute> {
    let mut rows: Vec<Merged> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();

    for (pos, sub) in direct.substitutes.iter().enumerate() {
        let idx = *by_name.entry(sub.name.as_str()).or_insert_with(|| {
            rows.push(Merged {
                name: &sub.name,
                direct: None,
                cooccurrence: None,
            });
            rows.len() - 1
        });
        rows[idx].direct.get_or_insert((pos, sub));
    }
    for (pos, sub) in cooccurrence.substitutes.iter().enumerate() {
        let idx = *by_name.entry(sub.name.as_str()).or_insert_with(|| {
            rows.push(Merged {
                name: &sub.name,
                direct: None,
                cooccurrence: None,
            });
            rows.len() - 1
        });
        rows[idx].cooccurrence.get_or_insert((pos, sub.score));
    }

    // A side with zero weight contributes no candidates
    rows.retain(|r| (alpha > 0.0 && r.direct.is_some()) || (alpha < 1.0 && r.cooccurrence.is_some()));

    let direct_first = alpha >= 0.5;
    let mut scored: Vec<(f64, usize, usize, &Merged)> = rows
        .iter()
        .map(|r| {
            let d = r.direct.map_or(0.0, |(_, s)| s.score);
            let c = r.cooccurrence.map_or(0.0, |(_, s)| s);
            let score = round4(clamp_unit(alpha * d + (1.0 - alpha) * c));

            let d_pos = r.direct.map_or(usize::MAX, |(p, _)| p);
            let c_pos = r.cooccurrence.map_or(usize::MAX, |(p, _)| p);
            let (first, second) = if direct_first { (d_pos, c_pos) } else { (c_pos, d_pos) };
            (score, first, second, r)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, _, _, r)| Substitute {
            name: r.name.to_string(),
            score,
            // Only context-specific direct matches carry a context
            context: r
                .direct
                .filter(|_| direct.matched_context)
                .and_then(|(_, s)| s.context.clone()),
            source: SubstituteSource::Hybrid,
        })
        .collect()
}
