//! Prometheus metrics
//!
//! Recorded through the `metrics` facade; they are no-ops unless an
//! exporter has been installed.

use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;

use crate::gate::EdgeDecision;

const ANALYSES_TOTAL: &str = "polybet_analyses_total";
const REJECTIONS_TOTAL: &str = "polybet_rejections_total";
const FAILURES_TOTAL: &str = "polybet_analysis_failures_total";
const QUOTE_FALLBACKS_TOTAL: &str = "polybet_quote_fallbacks_total";
const FETCH_LATENCY_SECONDS: &str = "polybet_fetch_latency_seconds";
const EXPECTED_VALUE: &str = "polybet_expected_value";

/// Count a completed analysis and its reject reasons
pub fn record_analysis(decision: &EdgeDecision) {
    let outcome = if decision.approved { "approved" } else { "rejected" };
    metrics::counter!(ANALYSES_TOTAL, "outcome" => outcome, "side" => decision.side.to_string())
        .increment(1);

    for reason in &decision.reject_reasons {
        metrics::counter!(REJECTIONS_TOTAL, "reason" => reason.to_string()).increment(1);
    }

    if let Some(ev) = decision.expected_value.to_f64() {
        metrics::histogram!(EXPECTED_VALUE).record(ev);
    }
}

/// Count an analysis that ended in a typed failure
pub fn record_failure(kind: &'static str) {
    metrics::counter!(FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Count a CLOB read that fell back to Gamma quotes
pub fn record_quote_fallback(what: &'static str) {
    metrics::counter!(QUOTE_FALLBACKS_TOTAL, "what" => what).increment(1);
}

/// Record one HTTP round trip
pub fn record_fetch_latency(elapsed: Duration) {
    metrics::histogram!(FETCH_LATENCY_SECONDS).record(elapsed.as_secs_f64());
}
