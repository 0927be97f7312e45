//! Metrics registry for addon operator observability
//!
//! Provides OpenTelemetry metrics for:
//! - OCM addon status service latency
//! - Controller reconciliation duration

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Histogram, Meter};
use opentelemetry::KeyValue;

#[cfg(test)]
use mockall::automock;

/// Global meter for addon operator metrics
static METER: Lazy<Meter> = Lazy::new(|| global::meter("addon-operator"));

/// Histogram of OCM addon status service request latency
///
/// Recorded for every attempted call, successful or not.
pub static ADDON_SERVICE_API_REQUEST_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("addon_operator_addon_service_api_request_duration_seconds")
        .with_description("Duration of requests to the OCM addon status service in seconds")
        .with_unit("s")
        .build()
});

/// Histogram of reconciliation duration
///
/// Labels:
/// - `controller`: addon, addon_operator
/// - `result`: success, error
pub static RECONCILE_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("addon_operator_reconcile_duration_seconds")
        .with_description("Duration of reconciliation in seconds")
        .with_unit("s")
        .build()
});

/// Side channel for remote call latency
///
/// Implementations must never block or fail; observing is fire and forget.
#[cfg_attr(test, automock)]
pub trait MetricsRecorder: Send + Sync {
    /// Record the duration of one OCM API request
    fn observe_request_duration(&self, seconds: f64);
}

/// [`MetricsRecorder`] backed by the global OpenTelemetry meter
#[derive(Clone, Copy, Debug, Default)]
pub struct OtelMetricsRecorder;

impl MetricsRecorder for OtelMetricsRecorder {
    fn observe_request_duration(&self, seconds: f64) {
        ADDON_SERVICE_API_REQUEST_DURATION.record(seconds, &[]);
    }
}

/// Record a reconciliation's duration and outcome
pub fn record_reconcile(controller: &'static str, success: bool, seconds: f64) {
    let result = if success { "success" } else { "error" };
    RECONCILE_DURATION.record(
        seconds,
        &[
            KeyValue::new("controller", controller),
            KeyValue::new("result", result),
        ],
    );
}
