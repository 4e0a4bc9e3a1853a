/*!
 * Structured Tracing
 * Subscriber setup and timing spans for collector work
 */

use crate::core::limits::ENV_TRACE_JSON;
use crate::memory::stats::HeapStats;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Collections slower than this are reported at warn level
pub const SLOW_COLLECTION: Duration = Duration::from_millis(10);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - GC_ALLOC_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Times one collection cycle and logs heap counters when it ends
pub struct CollectionSpan {
    span: tracing::Span,
    start: Instant,
    before: HeapStats,
    after: Option<HeapStats>,
}

impl CollectionSpan {
    pub fn new(reason: &str, before: HeapStats) -> Self {
        let span = span!(
            Level::DEBUG,
            "collection",
            reason = reason,
            heap_size = before.heap_size,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            before,
            after: None,
        }
    }

    /// Record the heap counters observed after the collection
    pub fn finish(mut self, after: HeapStats) {
        self.after = Some(after);
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for CollectionSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        let after = self.after.unwrap_or(self.before);
        let reclaimed = self.before.used_bytes().saturating_sub(after.used_bytes());

        if duration > SLOW_COLLECTION {
            warn!(
                duration_ms = duration.as_millis() as u64,
                heap_size = after.heap_size,
                reclaimed,
                slow = true,
                "slow collection"
            );
        } else {
            debug!(
                duration_us = duration.as_micros() as u64,
                heap_size = after.heap_size,
                reclaimed,
                "collection completed"
            );
        }
    }
}
