//! Tracing and logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration and request spans.
pub mod tracing;

pub use self::tracing::{correlation_id, request_span, TRACE_ID_HEADER};
