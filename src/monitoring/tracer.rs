/*!
 * Tracing
 * Structured tracing for filesystem and module operations using the tracing crate
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::limits::ENV_TRACE_JSON;

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SCRIPT_VFS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    // try_init: a second call (tests, embedding hosts) keeps the first subscriber
    if use_json {
        let _ = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init();
        info!("Structured tracing initialized with JSON output");
    } else {
        let _ = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init();
        info!("Structured tracing initialized");
    }
}

/// Span wrapping one multi-step filesystem operation (move, copy, mount)
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: u64,
}

impl OperationSpan {
    pub fn new(operation: &str) -> Self {
        let trace_id = NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed);

        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = trace_id,
            operation = operation,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(operation = operation, trace_id = trace_id, "operation started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    /// Get the trace ID for this operation
    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    /// Record the outcome of the operation
    pub fn finish<T, E: std::fmt::Display>(self, result: &Result<T, E>) {
        let elapsed = self.start.elapsed().as_micros() as u64;
        self.span.record("duration_us", elapsed);
        match result {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("error", e.to_string().as_str());
            }
        }
        let _entered = self.span.enter();
        debug!(trace_id = self.trace_id, duration_us = elapsed, "operation finished");
    }
}

/// Helper to create an operation span
#[inline]
pub fn span_operation(name: &str) -> OperationSpan {
    OperationSpan::new(name)
}
