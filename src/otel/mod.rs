//! Tracing instrumentation for ranking and substitution requests.
//!
//! Span attributes loosely follow OpenTelemetry naming so the output can be
//! shipped to a collector by whatever subscriber the host installs.
//!
//! # Span conventions
//!
//! **Engine operations** (`engine` span, INTERNAL kind):
//! - `otel.name`: `{engine.operation} {target}`, e.g. `suggest_recipes egg,flour`
//! - `engine.candidates`, `engine.returned`: recorded on completion
//!
//! **Port calls** (`store` span, CLIENT kind):
//! - `store.dependency`: `embedding`, `vector_index`, `recipe_store`, `graph`
//! - `store.system`: backend name (`flat`, `hnsw`, `rocksdb`, `neo4j`, `memory`, `openai`, `hash`)
//! - `store.rows`: rows returned
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_core::otel::{engine_span, EngineOperation};
//!
//! let span = engine_span(EngineOperation::GetSubstitutes, "butter");
//! async move { resolve().await }.instrument(span).await
//! ```

pub mod engine;
pub mod store;
pub mod subscriber;

pub use engine::{engine_span, record_result_metrics, EngineOperation};
pub use store::{record_store_rows, store_span};
pub use subscriber::{init_tracing, LogFormat};
