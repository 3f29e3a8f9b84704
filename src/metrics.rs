//! Prometheus metrics for the deployer
//!
//! # Exported metrics
//! The `/metrics` endpoint (when built with `--features metrics`) exports:
//! - `deployer_operations_total` (counter): operations labeled by operation and outcome
//!   (`changed`, `noop`, `error`).
//! - `deployer_operation_errors_total` (counter): failures labeled by operation and error kind.
//! - `deployer_operation_duration_seconds` (histogram): wall time labeled by operation.

use std::sync::atomic::AtomicU64;

use once_cell::sync::Lazy;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use crate::deployer::Outcome;
use crate::error::{Error, Result};
use crate::status::StatusReport;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    /// deploy, destroy, update or status
    pub operation: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub operation: String,
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub operation: String,
    /// Value of [`Error::kind`]
    pub kind: String,
}

pub static OPERATIONS_TOTAL: Lazy<Family<OutcomeLabels, Counter<u64, AtomicU64>>> =
    Lazy::new(Family::default);

pub static OPERATION_ERRORS_TOTAL: Lazy<Family<ErrorLabels, Counter<u64, AtomicU64>>> =
    Lazy::new(Family::default);

/// Histogram tracking operation duration (seconds)
pub static OPERATION_DURATION_SECONDS: Lazy<Family<OperationLabels, Histogram>> =
    Lazy::new(|| {
        fn operation_histogram() -> Histogram {
            // 10ms .. ~160s; a clone and push of a large repository can be slow.
            Histogram::new(exponential_buckets(0.01, 2.0, 15))
        }

        Family::new_with_constructor(operation_histogram)
    });

pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();

    registry.register(
        "deployer_operations",
        "Total number of deployer operations by outcome",
        OPERATIONS_TOTAL.clone(),
    );
    registry.register(
        "deployer_operation_errors",
        "Total number of failed deployer operations by error kind",
        OPERATION_ERRORS_TOTAL.clone(),
    );
    registry.register(
        "deployer_operation_duration_seconds",
        "Duration of deployer operations in seconds",
        OPERATION_DURATION_SECONDS.clone(),
    );

    registry
});

/// Successful operation results that can be classified for metrics
pub trait Observed {
    fn outcome_label(&self) -> &'static str;
}

impl Observed for Outcome {
    fn outcome_label(&self) -> &'static str {
        if self.is_changed() {
            "changed"
        } else {
            "noop"
        }
    }
}

impl Observed for StatusReport {
    fn outcome_label(&self) -> &'static str {
        "noop"
    }
}

/// Observe an operation duration in seconds.
pub fn observe_operation_duration_seconds(operation: &str, seconds: f64) {
    let labels = OperationLabels {
        operation: operation.to_string(),
    };
    OPERATION_DURATION_SECONDS
        .get_or_create(&labels)
        .observe(seconds);
}

/// Increment the operation counter for one outcome.
pub fn inc_operation(operation: &str, outcome: &str) {
    let labels = OutcomeLabels {
        operation: operation.to_string(),
        outcome: outcome.to_string(),
    };
    OPERATIONS_TOTAL.get_or_create(&labels).inc();
}

/// Increment the operation error counter.
pub fn inc_operation_error(operation: &str, error: &Error) {
    let labels = ErrorLabels {
        operation: operation.to_string(),
        kind: error.kind().to_string(),
    };
    OPERATION_ERRORS_TOTAL.get_or_create(&labels).inc();
}

/// Record duration, outcome and error kind of a finished operation
pub fn observe_operation<T: Observed>(operation: &str, seconds: f64, result: &Result<T>) {
    observe_operation_duration_seconds(operation, seconds);
    match result {
        Ok(value) => inc_operation(operation, value.outcome_label()),
        Err(e) => {
            inc_operation(operation, "error");
            inc_operation_error(operation, e);
        }
    }
}

/// Render the registry in the OpenMetrics text format
pub fn encode_registry() -> Result<String> {
    let mut buffer = String::new();
    encode(&mut buffer, &REGISTRY)
        .map_err(|e| Error::ConfigError(format!("failed to encode metrics: {e}")))?;
    Ok(buffer)
}
