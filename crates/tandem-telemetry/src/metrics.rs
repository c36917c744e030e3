//! Metric name constants and recording helpers

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Histogram, Meter};

/// Instrumentation scope every Tandem instrument is registered under
pub const METER_NAME: &str = "tandem";

/// Meter from the global provider; a no-op until telemetry export is configured
pub fn meter() -> Meter {
    opentelemetry::global::meter(METER_NAME)
}

/// Record the time elapsed since `start` on a histogram, in seconds
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

// Routing metric names
pub const ROUTING_DECISION_COUNT: &str = "routing.decision.count";
pub const ROUTING_SCORE_DURATION: &str = "routing.score.duration";
pub const ROUTING_ESTIMATION_DURATION: &str = "routing.estimation.duration";

// Completion forwarding metric names
pub const LLM_REQUEST_DURATION: &str = "llm.request.duration";
