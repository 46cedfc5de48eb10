//! Tracing setup and the per-failure diagnostic record.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Structured failure records and where they go.
pub mod diagnostics;

pub use diagnostics::{DiagnosticRecord, DiagnosticSink, MemorySink, TracingSink};
