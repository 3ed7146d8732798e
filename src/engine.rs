//! Engine facade: the operations exposed to the surrounding application.
//!
//! Ports are injected as `Arc` trait objects, so the engine is cheap to clone
//! and share across request handlers. Nothing here mutates shared state except
//! [`PlateEngine::replace_index`], which swaps a complete index in one step.

use crate::config::{
    expand_path, EmbeddingProviderKind, EngineConfig, GraphKind, IndexKind, StoreKind,
};
use crate::embeddings::{EmbeddingProvider, HashEmbedder, OpenAIEmbedder};
use crate::graph::{GraphStore, MemoryGraph, Neo4jGraph};
use crate::index::{FlatIndex, HnswIndex, HnswParams, IndexHandle, VectorIndex, VectorSnapshot};
use crate::otel::{engine_span, record_result_metrics, EngineOperation};
use crate::ranker::HybridRanker;
use crate::storage::{MemoryRecipeStore, RecipeStore, RocksRecipeStore};
use crate::substitution::{pantry_report, CooccurrenceResolver, DirectResolver, HybridBlender};
use crate::types::{
    EngineError, PantryReport, RankedRecipe, Recipe, Result, SubstituteParams, SubstitutionResult,
    SuggestParams,
};
use std::sync::Arc;
use tracing::Instrument;

/// Recipe suggestion and substitution engine.
#[derive(Clone)]
pub struct PlateEngine {
    ranker: HybridRanker,
    blender: HybridBlender,
    index: Arc<IndexHandle>,
    store: Arc<dyn RecipeStore>,
    suggest_defaults: SuggestParams,
    substitute_defaults: SubstituteParams,
}

impl PlateEngine {
    /// Assemble an engine from its ports.
    ///
    /// # Arguments
    ///
    /// * `embedder` - Query embedding provider
    /// * `index` - Recipe vector index (row `n` is `RecipeRef(n)`)
    /// * `store` - Recipe metadata store
    /// * `graph` - Substitution graph
    /// * `cooccurrence_ceiling` - Frequency that maps to co-occurrence score 1.0
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DimensionMismatch` if embedder and index disagree
    /// and `EngineError::ConfigError` for a non-positive ceiling
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn RecipeStore>,
        graph: Arc<dyn GraphStore>,
        cooccurrence_ceiling: f64,
    ) -> Result<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(EngineError::DimensionMismatch {
                expected: index.dimensions(),
                got: embedder.dimensions(),
            });
        }

        let index = Arc::new(IndexHandle::new(index));
        let ranker = HybridRanker::new(embedder, index.clone(), Arc::clone(&store));
        let blender = HybridBlender::new(
            Arc::new(DirectResolver::new(Arc::clone(&graph))),
            Arc::new(CooccurrenceResolver::new(graph, cooccurrence_ceiling)?),
        );

        Ok(Self {
            ranker,
            blender,
            index,
            store,
            suggest_defaults: SuggestParams::default(),
            substitute_defaults: SubstituteParams::default(),
        })
    }

    /// Replace request defaults (CLI flags and config fall back to these).
    pub fn with_defaults(mut self, suggest: SuggestParams, substitute: SubstituteParams) -> Self {
        self.suggest_defaults = suggest;
        self.substitute_defaults = substitute;
        self
    }

    /// Build every port described by `config`.
    ///
    /// The vector snapshot is loaded and indexed on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ConfigError` for missing credentials or paths, and
    /// any error raised while opening a store
    pub async fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
            EmbeddingProviderKind::Hash => {
                Arc::new(HashEmbedder::new(config.embedding.dimensions)?)
            }
            EmbeddingProviderKind::OpenAI => {
                let api_key = secret(&config.embedding.api_key_env)?;
                Arc::new(
                    OpenAIEmbedder::new(api_key, config.embedding.model.clone())
                        .with_dimensions(config.embedding.dimensions)?,
                )
            }
        };

        let snapshot_path = config.snapshot_path();
        let kind = config.index.kind;
        let params = HnswParams {
            ef_construction: config.index.ef_construction,
            ef_search: config.index.ef_search,
            ..HnswParams::default()
        };
        let index: Arc<dyn VectorIndex> = tokio::task::spawn_blocking(move || {
            let snapshot = VectorSnapshot::load(&snapshot_path)?;
            let index: Arc<dyn VectorIndex> = match kind {
                IndexKind::Flat => Arc::new(FlatIndex::from_snapshot(snapshot)?),
                IndexKind::Hnsw => Arc::new(HnswIndex::from_snapshot(snapshot, params)?),
            };
            Ok::<_, EngineError>(index)
        })
        .await??;

        let store: Arc<dyn RecipeStore> = match config.store.kind {
            StoreKind::Rocksdb => Arc::new(RocksRecipeStore::open(config.store_path())?),
            StoreKind::Csv => Arc::new(MemoryRecipeStore::from_csv(config.store_path())?),
        };

        let graph: Arc<dyn GraphStore> = match config.graph.kind {
            GraphKind::Neo4j => {
                let password = secret(&config.graph.password_env)?;
                Arc::new(
                    Neo4jGraph::connect(&config.graph.uri, &config.graph.user, &password).await?,
                )
            }
            GraphKind::Csv => {
                let substitutes = config.graph.substitutes.as_deref().ok_or_else(|| {
                    EngineError::ConfigError("graph.substitutes is required for csv graphs".into())
                })?;
                let memberships = config.graph.recipe_ingredients.as_deref().map(expand_path);
                Arc::new(MemoryGraph::from_csv(expand_path(substitutes), memberships)?)
            }
        };

        tracing::info!(
            embedder = embedder.system(),
            index = index.system(),
            recipes = index.len(),
            store = store.system(),
            graph = graph.system(),
            "Engine ready"
        );

        Ok(Self::new(embedder, index, store, graph, config.substitution.cooccurrence_ceiling)?
            .with_defaults(config.ranker.clone(), config.substitution.params()))
    }

    pub fn suggest_defaults(&self) -> &SuggestParams {
        &self.suggest_defaults
    }

    pub fn substitute_defaults(&self) -> &SubstituteParams {
        &self.substitute_defaults
    }

    /// Rank recipes for a set of available ingredients.
    ///
    /// See [`HybridRanker::suggest`] for scoring and error semantics.
    pub async fn suggest_recipes(
        &self,
        ingredients: &[String],
        params: &SuggestParams,
    ) -> Result<Vec<RankedRecipe>> {
        let span = engine_span(EngineOperation::SuggestRecipes, &ingredients.join(","));
        self.ranker.suggest(ingredients, params).instrument(span).await
    }

    /// Ranked substitutes for `ingredient`.
    ///
    /// `hybrid = false` returns the direct resolver's list as-is (`direct` or
    /// `fallback` rows); otherwise the blended list with `hybrid` rows.
    pub async fn get_substitutes(
        &self,
        ingredient: &str,
        params: &SubstituteParams,
    ) -> Result<SubstitutionResult> {
        let span = engine_span(EngineOperation::GetSubstitutes, ingredient);
        async {
            params.validate()?;
            let context = params.context.as_deref();
            let result = if params.hybrid {
                self.blender.blend(ingredient, context, params.top_k, params.alpha).await?
            } else {
                self.blender.direct().resolve(ingredient, context, params.top_k).await?
            };
            record_result_metrics(result.substitutes.len(), result.substitutes.len());
            tracing::info!(
                matched_context = result.matched_context,
                returned = result.substitutes.len(),
                "Resolved substitutes"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Pantry coverage for a recipe plus substitutes for what is missing.
    ///
    /// Uses the configured `alpha` and no context.
    pub async fn pantry_substitutions(
        &self,
        recipe_ingredients: &[String],
        pantry: &[String],
        top_k: usize,
    ) -> Result<PantryReport> {
        let span = engine_span(EngineOperation::PantrySubstitutions, &recipe_ingredients.join(","));
        pantry_report(
            &self.blender,
            recipe_ingredients,
            pantry,
            top_k,
            self.substitute_defaults.alpha,
        )
        .instrument(span)
        .await
    }

    /// Case-insensitive exact title lookup; `None` if no recipe has the title.
    pub async fn recipe_details(&self, title: &str) -> Result<Option<Recipe>> {
        let span = engine_span(EngineOperation::RecipeDetails, title);
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::invalid("title must not be empty"));
        }

        let store = Arc::clone(&self.store);
        let found = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            store.find_by_title(&title)
        })
        .await??;
        Ok(found.map(|(_, recipe)| recipe))
    }

    /// Install a fully built replacement index. In-flight searches finish on
    /// the index they started with.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DimensionMismatch` if `next` has a different
    /// dimensionality than the live index
    pub fn replace_index(&self, next: Arc<dyn VectorIndex>) -> Result<Arc<dyn VectorIndex>> {
        let current = self.index.dimensions();
        if next.dimensions() != current {
            return Err(EngineError::DimensionMismatch {
                expected: current,
                got: next.dimensions(),
            });
        }
        tracing::info!(recipes = next.len(), "Replacing live index");
        Ok(self.index.swap(next))
    }
}

/// Read a credential from the environment variable named `var`.
fn secret(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| EngineError::ConfigError(format!("{} is not set", var)))
}
