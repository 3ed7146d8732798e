//! Plate CLI: recipe suggestions and ingredient substitutes from the terminal.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use plate_core::config::{expand_path, CONFIG_ENV};
use plate_core::otel::{init_tracing, LogFormat};
use plate_core::storage::{import, RocksRecipeStore};
use plate_core::{EngineConfig, PlateEngine, SubstituteParams, SuggestParams};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plate")]
#[command(about = "Recipe suggestions and ingredient substitutes", long_about = None)]
struct Cli {
    /// Config file (default: ~/.plate/config.yaml)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest recipes for the ingredients you have
    Suggest {
        /// Available ingredients
        #[arg(required = true)]
        ingredients: Vec<String>,

        /// Number of recipes to return
        #[arg(long)]
        top_n: Option<usize>,

        /// Weight of ingredient overlap vs semantic similarity, in [0, 1]
        #[arg(long)]
        rerank_weight: Option<f64>,

        /// Nearest neighbors fetched before filtering
        #[arg(long)]
        pool: Option<usize>,

        /// Minimum shared ingredients
        #[arg(long)]
        min_overlap: Option<usize>,
    },

    /// Find substitutes for an ingredient
    Substitutes {
        /// Ingredient to replace
        ingredient: String,

        /// Usage context (e.g. baking)
        #[arg(long)]
        context: Option<String>,

        /// Direct substitution edges only, no co-occurrence blend
        #[arg(long)]
        direct_only: bool,

        /// Number of substitutes
        #[arg(long)]
        top_k: Option<usize>,

        /// Weight on direct edges, in [0, 1]
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Check a recipe against your pantry
    Pantry {
        /// Recipe title (ingredients are looked up)
        #[arg(long, conflicts_with = "ingredients", required_unless_present = "ingredients")]
        title: Option<String>,

        /// Recipe ingredients, comma-separated
        #[arg(long, value_delimiter = ',')]
        ingredients: Vec<String>,

        /// Pantry items, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        pantry: Vec<String>,

        /// Substitutes per missing ingredient (per list)
        #[arg(long, default_value = "3")]
        top_k: usize,
    },

    /// Show a recipe by title
    Recipe {
        title: String,
    },

    /// Import recipe metadata CSV into the RocksDB store
    Import {
        /// CSV with title, NER, directions, link, source columns
        file: PathBuf,

        /// Store directory (default: store.path from config)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let mut config = EngineConfig::load(expand_path(&path.to_string_lossy()))
                .with_context(|| format!("loading config {}", path.display()))?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config.validate()?;
            Ok(config)
        }
        None => Ok(EngineConfig::from_env()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Import { file, store } => {
            let path = store.unwrap_or_else(|| config.store_path());
            let recipes = import::read_recipes(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let written = tokio::task::spawn_blocking(move || {
                RocksRecipeStore::open(&path)?.import(&recipes)
            })
            .await??;
            eprintln!("Imported {} recipes", written);
        }

        Commands::Suggest {
            ingredients,
            top_n,
            rerank_weight,
            pool,
            min_overlap,
        } => {
            let engine = PlateEngine::from_config(&config).await?;
            let defaults = engine.suggest_defaults();
            let params = SuggestParams {
                top_n: top_n.unwrap_or(defaults.top_n),
                rerank_weight: rerank_weight.unwrap_or(defaults.rerank_weight),
                candidate_pool_size: pool.unwrap_or(defaults.candidate_pool_size),
                min_overlap: min_overlap.unwrap_or(defaults.min_overlap),
            };
            print_json(&engine.suggest_recipes(&ingredients, &params).await?)?;
        }

        Commands::Substitutes {
            ingredient,
            context,
            direct_only,
            top_k,
            alpha,
        } => {
            let engine = PlateEngine::from_config(&config).await?;
            let defaults = engine.substitute_defaults();
            let params = SubstituteParams {
                context,
                hybrid: defaults.hybrid && !direct_only,
                top_k: top_k.unwrap_or(defaults.top_k),
                alpha: alpha.unwrap_or(defaults.alpha),
            };
            print_json(&engine.get_substitutes(&ingredient, &params).await?)?;
        }

        Commands::Pantry {
            title,
            ingredients,
            pantry,
            top_k,
        } => {
            let engine = PlateEngine::from_config(&config).await?;
            let recipe_ingredients = match title {
                Some(title) => match engine.recipe_details(&title).await? {
                    Some(recipe) => recipe.ingredients,
                    None => bail!("No recipe titled '{}'", title),
                },
                None => ingredients,
            };
            print_json(
                &engine
                    .pantry_substitutions(&recipe_ingredients, &pantry, top_k)
                    .await?,
            )?;
        }

        Commands::Recipe { title } => {
            let engine = PlateEngine::from_config(&config).await?;
            match engine.recipe_details(&title).await? {
                Some(recipe) => print_json(&recipe)?,
                None => bail!("No recipe titled '{}'", title),
            }
        }
    }

    Ok(())
}
