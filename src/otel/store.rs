//! Port call instrumentation (embedding service, index, metadata store, graph).

use crate::types::Dependency;
use tracing::{field, span, Level, Span};

/// Create a client span around one port call.
///
/// # Arguments
///
/// * `dependency` - Which port is called
/// * `system` - Backend name reported by the adapter
/// * `operation` - Port operation (`embed`, `search`, `get_recipe`, `substitutes`, ...)
pub fn store_span(dependency: Dependency, system: &str, operation: &str) -> Span {
    span!(
        Level::INFO,
        "store",
        otel.name = format!("{} {}", operation, dependency.as_str()),
        otel.kind = "client",
        store.dependency = dependency.as_str(),
        store.system = system,
        store.operation = operation,
        store.rows = field::Empty,
    )
}

/// Record rows returned by a port call on the current span.
pub fn record_store_rows(rows: usize) {
    Span::current().record("store.rows", rows);
}
