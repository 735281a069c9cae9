//! Tracing/logging initialization and per-request spans.

use authhub_core::TraceId;
use tracing_subscriber::EnvFilter;

/// Header carrying the correlation id between services.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init();
}

/// Inbound correlation id, or a fresh one when absent or blank.
pub fn correlation_id(inbound: Option<&str>) -> TraceId {
    TraceId::parse_optional(inbound).unwrap_or_else(TraceId::generate)
}

/// Span wrapping one request. `user_id` is recorded once the identity is known.
pub fn request_span(method: &str, path: &str, trace_id: &TraceId) -> ::tracing::Span {
    ::tracing::info_span!(
        "request",
        method = %method,
        path = %path,
        trace_id = %trace_id,
        user_id = ::tracing::field::Empty,
    )
}
