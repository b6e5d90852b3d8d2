/*!
 * Structured Tracing
 * Subscriber setup and per-poll spans using the tracing crate
 */

use crate::core::limits::SLOW_POLL_THRESHOLD;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POLICY_WATCH_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POLICY_WATCH_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    // try_init: a subscriber may already be installed (tests, embedding hosts)
    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique ID for correlating a watcher's log lines
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one poll iteration
pub struct PollSpan {
    span: tracing::Span,
    start: Instant,
    iteration: u64,
}

impl PollSpan {
    pub fn new(watcher_id: &str, iteration: u64) -> Self {
        let span = span!(
            Level::DEBUG,
            "poll",
            watcher_id = %watcher_id,
            iteration = iteration,
            result = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            iteration,
        }
    }

    pub fn record_result(&self, success: bool) {
        self.span.record("result", if success { "success" } else { "error" });
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PollSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_POLL_THRESHOLD {
            warn!(
                iteration = self.iteration,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow policy lookup"
            );
        } else {
            debug!(iteration = self.iteration, "poll completed");
        }
    }
}

/// Helper to create a poll span
#[inline]
pub fn span_poll(watcher_id: &str, iteration: u64) -> PollSpan {
    PollSpan::new(watcher_id, iteration)
}
