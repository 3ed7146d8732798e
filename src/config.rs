//! Engine configuration and data location management.
//!
//! Loaded from YAML (`$PLATE_CONFIG` or `~/.plate/config.yaml`), then
//! overridden by environment variables. Every section has defaults, so an
//! absent file is a valid configuration.
//!
//! ```yaml
//! ranker:
//!   top_n: 5
//!   rerank_weight: 0.6
//! substitution:
//!   alpha: 0.9
//!   cooccurrence_ceiling: 50.0
//! embedding:
//!   provider: openai
//!   dimensions: 1536
//! index:
//!   kind: hnsw
//!   snapshot: ~/.plate/recipes.vec
//! store:
//!   kind: rocksdb
//!   path: ~/.plate/recipes.db
//! graph:
//!   kind: neo4j
//!   uri: neo4j://localhost:7687
//! ```

use crate::types::{EngineError, Result, SubstituteParams, SuggestParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file location override
pub const CONFIG_ENV: &str = "PLATE_CONFIG";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default suggestion parameters
    pub ranker: SuggestParams,
    pub substitution: SubstitutionConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub store: StoreConfig,
    pub graph: GraphConfig,
}

/// Substitution defaults and co-occurrence calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionConfig {
    pub top_k: usize,
    pub alpha: f64,
    pub hybrid: bool,

    /// Shared-recipe frequency that maps to a co-occurrence score of 1.0
    pub cooccurrence_ceiling: f64,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            alpha: 0.9,
            hybrid: true,
            cooccurrence_ceiling: 50.0,
        }
    }
}

impl SubstitutionConfig {
    /// Default request parameters (no context).
    pub fn params(&self) -> SubstituteParams {
        SubstituteParams {
            context: None,
            hybrid: self.hybrid,
            top_k: self.top_k,
            alpha: self.alpha,
        }
    }
}

/// Embedding backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local feature hashing
    #[default]
    Hash,
    /// OpenAI embeddings API
    OpenAI,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "openai" => Ok(Self::OpenAI),
            other => Err(EngineError::ConfigError(format!(
                "Unknown embedding provider '{}' (expected hash or openai)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,

    /// Must match the vector snapshot
    pub dimensions: usize,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact scan
    #[default]
    Flat,
    /// Approximate HNSW graph
    Hnsw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub kind: IndexKind,

    /// Bincode `VectorSnapshot` file
    pub snapshot: String,

    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Flat,
            snapshot: "~/.plate/recipes.vec".to_string(),
            ef_construction: 100,
            ef_search: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// RocksDB directory written by `plate import`
    #[default]
    Rocksdb,
    /// Metadata CSV loaded into memory
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Rocksdb,
            path: "~/.plate/recipes.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    #[default]
    Neo4j,
    /// Edge-list CSVs loaded into memory
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub kind: GraphKind,
    pub uri: String,
    pub user: String,

    /// Environment variable holding the Neo4j password
    pub password_env: String,

    /// `ingredient,substitute,score,context` edge list (csv kind)
    pub substitutes: Option<String>,

    /// `recipe,ingredient` membership list (csv kind)
    pub recipe_ingredients: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            kind: GraphKind::Neo4j,
            uri: "neo4j://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password_env: "NEO4J_PASSWORD".to_string(),
            substitutes: None,
            recipe_ingredients: None,
        }
    }
}

impl EngineConfig {
    /// Get default config file path (~/.plate/config.yaml).
    pub fn default_path() -> PathBuf {
        expand_path("~/.plate/config.yaml")
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::IoError` if unreadable, `EngineError::YamlError`
    /// on bad syntax and `EngineError::ConfigError` on out-of-range values
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from `$PLATE_CONFIG` (or the default path) plus
    /// environment overrides. A missing default file yields defaults; a missing
    /// explicitly named file is an error.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(expand_path(&path))?,
            Err(_) => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PLATE_*` / `NEO4J_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PLATE_INDEX_SNAPSHOT") {
            self.index.snapshot = path;
        }
        if let Some(path) = lookup("PLATE_STORE_PATH") {
            self.store.path = path;
        }
        if let Some(uri) = lookup("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(provider) = lookup("PLATE_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        Ok(())
    }

    /// Check ranges of every default.
    pub fn validate(&self) -> Result<()> {
        self.ranker
            .validate()
            .map_err(|e| EngineError::ConfigError(format!("ranker: {}", e)))?;
        self.substitution
            .params()
            .validate()
            .map_err(|e| EngineError::ConfigError(format!("substitution: {}", e)))?;

        // Pantry reports blend even when get_substitutes defaults to direct-only
        if !(0.0..=1.0).contains(&self.substitution.alpha) {
            return Err(EngineError::ConfigError(format!(
                "substitution: alpha must be in [0, 1], got {}",
                self.substitution.alpha
            )));
        }

        let ceiling = self.substitution.cooccurrence_ceiling;
        if !(ceiling.is_finite() && ceiling > 0.0) {
            return Err(EngineError::ConfigError(format!(
                "substitution: cooccurrence_ceiling must be > 0, got {}",
                ceiling
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(EngineError::ConfigError("embedding: dimensions must be > 0".to_string()));
        }
        if self.index.ef_construction == 0 || self.index.ef_search == 0 {
            return Err(EngineError::ConfigError("index: ef values must be > 0".to_string()));
        }
        // HNSW returns at most ef_search neighbors per query
        if self.index.kind == IndexKind::Hnsw
            && self.index.ef_search < self.ranker.candidate_pool_size
        {
            return Err(EngineError::ConfigError(format!(
                "index: ef_search ({}) must be >= ranker.candidate_pool_size ({})",
                self.index.ef_search, self.ranker.candidate_pool_size
            )));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        expand_path(&self.index.snapshot)
    }

    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.store.path)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
