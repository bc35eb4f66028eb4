//! Metrics for fallback dispatch.
//!
//! Skipped backends are counted separately from attempts so that "nothing configured" and
//! "everything configured failed" stay distinguishable on dashboards.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use peroot_error::ExhaustionCause;
use std::sync::OnceLock;

static METRICS: OnceLock<GatewayMetrics> = OnceLock::new();

/// Counters and histograms recorded by the gateway.
#[derive(Clone)]
pub struct GatewayMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Backend invocations
    pub attempts: Counter<u64>,
    /// Failed backend invocations
    pub failures: Counter<u64>,
    /// Backends skipped before invocation
    pub skips: Counter<u64>,
    /// Dispatches served
    pub successes: Counter<u64>,
    /// Dispatches that ran out of backends
    pub exhaustions: Counter<u64>,
    /// Time to establish a stream, in seconds
    pub establish_duration: Histogram<f64>,
}

impl GatewayMetrics {
    fn init() -> Self {
        let meter = global::meter("peroot_gateway");

        Self {
            _meter: meter.clone(),
            attempts: meter
                .u64_counter("gateway.attempts")
                .with_description("Backend invocations")
                .build(),
            failures: meter
                .u64_counter("gateway.failures")
                .with_description("Failed backend invocations")
                .build(),
            skips: meter
                .u64_counter("gateway.skips")
                .with_description("Backends skipped as unavailable")
                .build(),
            successes: meter
                .u64_counter("gateway.successes")
                .with_description("Dispatches served by a backend")
                .build(),
            exhaustions: meter
                .u64_counter("gateway.exhaustions")
                .with_description("Dispatches that exhausted the fallback order")
                .build(),
            establish_duration: meter
                .f64_histogram("gateway.establish_duration")
                .with_unit("seconds")
                .with_description("Time for a backend to start streaming")
                .build(),
        }
    }

    /// Get the global gateway metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a backend invocation being started.
    pub fn record_attempt(&self, backend: &str) {
        self.attempts
            .add(1, &[KeyValue::new("backend", backend.to_string())]);
    }

    /// Record a backend that established its stream.
    pub fn record_success(&self, backend: &str, duration_secs: f64) {
        let labels = &[KeyValue::new("backend", backend.to_string())];
        self.successes.add(1, labels);
        self.establish_duration.record(duration_secs, labels);
    }

    /// Record a failed invocation.
    pub fn record_failure(&self, backend: &str, error_type: &str) {
        self.failures.add(
            1,
            &[
                KeyValue::new("backend", backend.to_string()),
                KeyValue::new("error_type", error_type.to_string()),
            ],
        );
    }

    /// Record a skipped backend.
    pub fn record_skip(&self, backend: &str, reason: &str) {
        self.skips.add(
            1,
            &[
                KeyValue::new("backend", backend.to_string()),
                KeyValue::new("reason", reason.to_string()),
            ],
        );
    }

    /// Record an exhausted fallback order.
    pub fn record_exhausted(&self, cause: ExhaustionCause) {
        let cause = match cause {
            ExhaustionCause::NoBackendAvailable => "none_available",
            ExhaustionCause::AllBackendsFailed => "all_failed",
        };
        self.exhaustions
            .add(1, &[KeyValue::new("cause", cause)]);
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}
