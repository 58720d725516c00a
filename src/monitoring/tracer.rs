/*!
 * Structured Tracing
 *
 * Subscriber setup and the per-run supervision span.
 *
 * Output always goes to stderr: the exec child uses stdout as its readiness
 * channel, so a log line there would be mistaken for the ready byte.
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SIGSUP_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling it more than once is harmless; later calls keep the first subscriber.
pub fn init_tracing() {
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
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique run ID for correlating parent and child logs
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one supervised run, from spawn to reap
pub struct SupervisionSpan {
    span: Span,
    start: Instant,
    run_id: String,
}

impl SupervisionSpan {
    pub fn new(launcher: &'static str) -> Self {
        let run_id = generate_run_id();
        let span = span!(
            Level::INFO,
            "supervise",
            run_id = %run_id,
            launcher,
            pid = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            run_id,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn record_pid(&self, pid: i32) {
        self.span.record("pid", pid);
    }

    pub fn record_outcome(&self, outcome: &dyn std::fmt::Display) {
        self.span.record("outcome", tracing::field::display(outcome));
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SupervisionSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        if elapsed.as_millis() > 1000 {
            warn!(run_id = %self.run_id, elapsed_ms = elapsed.as_millis() as u64, slow = true, "slow supervision");
        } else {
            info!(run_id = %self.run_id, elapsed_ms = elapsed.as_millis() as u64, "supervision finished");
        }
    }
}
