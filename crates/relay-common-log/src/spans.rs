//! Request tracing utilities.

use std::future::Future;
use tracing::{debug_span, info_span, Instrument, Span};

/// Create a span for one pipeline run.
///
/// `outcome` is left empty and recorded once the run finishes.
pub fn request_span(method: &str, path: &str) -> Span {
    info_span!(
        "request",
        method = %method,
        path = %path,
        outcome = tracing::field::Empty,
    )
}

/// Create a span for a transport send.
pub fn transport_span(method: &str, url: &str) -> Span {
    debug_span!("transport", method = %method, url = %url)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record the outcome of a run on the current span.
pub fn record_outcome(outcome: &str) {
    Span::current().record("outcome", outcome);
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Complete the timer and record duration.
    pub fn finish(self) {
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %self.elapsed_ms(),
            "operation completed"
        );
    }
}
