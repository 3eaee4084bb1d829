// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the pod placement operator.
//!
//! This module provides metrics collection with the namespace prefix
//! `multiarch_openshift_io_` (prometheus-safe version of "multiarch.openshift.io").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and their outcomes
//! - **Condition Metrics** - Mirror the status conditions of each `PodPlacementConfig`
//! - **Webhook Registration Metrics** - Track applies and deletes of the webhook configuration
//! - **Error Metrics** - Track error conditions and types
//!
//! # Example
//!
//! ```rust,no_run
//! use podplacement::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("PodPlacementConfig", std::time::Duration::from_secs(1));
//! ```

use crate::crd::Condition;
use crate::status_reasons::{ConditionStatus, ConditionType};
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "multiarch_openshift_io";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `PodPlacementConfig`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"])
        .expect("valid reconciliations_total definition");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("reconciliations_total registered once");
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"])
        .expect("valid reconciliation_duration_seconds definition");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("reconciliation_duration_seconds registered once");
    histogram
});

/// Total number of requeue operations
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: Reason for requeue (`error`, `not_available`, `available`)
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"])
        .expect("valid requeues_total definition");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("requeues_total registered once");
    counter
});

// ============================================================================
// Condition Metrics
// ============================================================================

/// Status of each condition on each `PodPlacementConfig`
///
/// Labels:
/// - `namespace`, `name`: The `PodPlacementConfig`
/// - `condition`: Condition type
///
/// Value: 1 if True, 0 if False, -1 if Unknown
pub static CONDITION_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_condition_status"),
        "Status of PodPlacementConfig conditions (1 = True, 0 = False, -1 = Unknown)",
    );
    let gauge = GaugeVec::new(opts, &["namespace", "name", "condition"])
        .expect("valid condition_status definition");
    METRICS_REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("condition_status registered once");
    gauge
});

// ============================================================================
// Webhook Registration Metrics
// ============================================================================

/// Total number of webhook configuration registrations and removals
///
/// Labels:
/// - `action`: `created` or `deleted`
pub static WEBHOOK_REGISTRATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_webhook_registrations_total"),
        "Total number of mutating webhook configuration operations by action",
    );
    let counter = CounterVec::new(opts, &["action"])
        .expect("valid webhook_registrations_total definition");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("webhook_registrations_total registered once");
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and error category
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"])
        .expect("valid errors_total definition");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("errors_total registered once");
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation requeue
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record an error
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record a creation or deletion of the webhook configuration
pub fn record_webhook_registration(action: &str) {
    WEBHOOK_REGISTRATIONS_TOTAL
        .with_label_values(&[action])
        .inc();
}

/// Gauge value for a condition status.
#[must_use]
pub fn condition_status_value(status: ConditionStatus) -> f64 {
    match status {
        ConditionStatus::True => 1.0,
        ConditionStatus::False => 0.0,
        ConditionStatus::Unknown => -1.0,
    }
}

/// Mirror a condition set into the condition status gauge
///
/// Only the operator's own condition types are exported; foreign entries kept
/// in the stored set are skipped.
pub fn record_conditions(namespace: &str, name: &str, conditions: &[Condition]) {
    for condition in conditions {
        let Some(condition_type) = ConditionType::from_type_str(&condition.r#type) else {
            continue;
        };
        CONDITION_STATUS
            .with_label_values(&[namespace, name, condition_type.as_str()])
            .set(condition_status_value(condition.condition_status()));
    }
}

/// Drop the condition gauges of a deleted `PodPlacementConfig`
pub fn forget_conditions(namespace: &str, name: &str, conditions: &[Condition]) {
    for condition_type in conditions
        .iter()
        .filter_map(|c| ConditionType::from_type_str(&c.r#type))
    {
        // Absent label sets are fine to ignore
        let _ = CONDITION_STATUS.remove_label_values(&[namespace, name, condition_type.as_str()]);
    }
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
