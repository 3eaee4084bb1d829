// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # podplacement - Architecture-aware pod placement operator for Kubernetes
//!
//! The operator enables an operand made of three independently deployed pieces:
//! a pod placement controller, an admission webhook that adds a scheduling gate
//! to new pods, and the `MutatingWebhookConfiguration` registering that webhook.
//! A `PodPlacementConfig` custom resource switches the operand on and reports,
//! through a fixed set of status conditions, whether it is available, progressing,
//! degraded or being deprovisioned.
//!
//! ## Modules
//!
//! - [`readiness`] - Pure derivation of status conditions and gating flags
//! - [`status_reasons`] - Condition types, reasons and messages
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation logic and condition-set persistence
//! - [`context`] - Shared context and operator configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use podplacement::readiness::{derive, ReadinessSnapshot};
//!
//! let report = derive(&ReadinessSnapshot {
//!     controller_available: false,
//!     webhook_available: true,
//!     controller_up_to_date: true,
//!     webhook_up_to_date: true,
//!     config_registered: true,
//!     deprovisioning: false,
//! });
//!
//! assert!(report.flags.degraded);
//! assert!(!report.flags.can_register_config);
//! ```

pub mod constants;
pub mod context;
pub mod crd;
pub mod labels;
pub mod metrics;
pub mod readiness;
pub mod reconcilers;
pub mod status_reasons;

#[cfg(test)]
mod readiness_tests;
