// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the pod placement operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the pod placement CRDs
pub const API_GROUP: &str = "multiarch.openshift.io";

/// Kind name for `PodPlacementConfig` resource
pub const KIND_POD_PLACEMENT_CONFIG: &str = "PodPlacementConfig";

/// Kind name for the admission registration object gated by the operator
pub const KIND_MUTATING_WEBHOOK_CONFIGURATION: &str = "MutatingWebhookConfiguration";

/// Kind name for the operand Deployments
pub const KIND_DEPLOYMENT: &str = "Deployment";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer holding a `PodPlacementConfig` until its operands are torn down
pub const POD_PLACEMENT_CONFIG_FINALIZER: &str =
    "podplacementconfig.multiarch.openshift.io/finalizer";

/// Name of the single `PodPlacementConfig` the operator acts on
pub const POD_PLACEMENT_CONFIG_NAME: &str = "cluster";

// ============================================================================
// Operand Defaults
// ============================================================================

/// Default name of the pod placement controller Deployment
pub const DEFAULT_CONTROLLER_DEPLOYMENT: &str = "pod-placement-controller";

/// Default name of the pod placement webhook Deployment
pub const DEFAULT_WEBHOOK_DEPLOYMENT: &str = "pod-placement-web-hook";

/// Default name of the Service fronting the webhook Deployment
pub const DEFAULT_WEBHOOK_SERVICE: &str = "pod-placement-web-hook";

/// Default namespace the operator and its operands run in
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "openshift-multiarch-tuning-operator";

/// Name of the `MutatingWebhookConfiguration` registered for the webhook
pub const MUTATING_WEBHOOK_CONFIGURATION_NAME: &str =
    "pod-placement-mutating-webhook-configuration";

/// Name of the single webhook entry inside the configuration
pub const MUTATING_WEBHOOK_NAME: &str = "pod-placement-scheduling-gate.multiarch.openshift.io";

/// HTTP path the webhook serves admission reviews on
pub const MUTATING_WEBHOOK_PATH: &str = "/add-pod-scheduling-gate";

/// Port the webhook Service exposes
pub const WEBHOOK_SERVICE_PORT: i32 = 443;

/// Annotation asking the service CA operator to inject the CA bundle
pub const INJECT_CABUNDLE_ANNOTATION: &str = "service.beta.openshift.io/inject-cabundle";

/// Timeout for the API server calling the webhook
pub const WEBHOOK_TIMEOUT_SECS: i32 = 10;

// ============================================================================
// Controller Runtime Constants
// ============================================================================

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "podplacement-operator";

/// Requeue interval when the operand is available
pub const REQUEUE_WHEN_READY_SECS: u64 = 300;

/// Requeue interval when the operand is not (yet) available
pub const REQUEUE_WHEN_NOT_READY_SECS: u64 = 30;

/// Requeue interval after a failed reconciliation
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Number of tokio worker threads for the operator runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address for the metrics server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// HTTP path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";
