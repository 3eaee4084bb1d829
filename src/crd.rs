// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for architecture-aware pod placement.
//!
//! This module defines the Kubernetes Custom Resource Definition used by the
//! operator to enable and configure the pod placement operand declaratively.
//!
//! # Resource Types
//!
//! - [`PodPlacementConfig`] - Enables the pod placement operand (controller, webhook
//!   and webhook configuration) and reports its health through status conditions
//!
//! # Example
//!
//! ```rust,no_run
//! use podplacement::crd::{LogVerbosity, PodPlacementConfigSpec};
//!
//! let spec = PodPlacementConfigSpec {
//!     log_verbosity: LogVerbosity::Debug,
//!     namespace_selector: None,
//!     plugins: None,
//!     priority: None,
//! };
//! ```

use crate::readiness::{self, DerivedFlags, ReadinessSnapshot};
use crate::status_reasons::{ConditionStatus, ConditionType};
use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. Available, Progressing, Degraded.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Parsed tri-state status of this condition.
    #[must_use]
    pub fn condition_status(&self) -> ConditionStatus {
        ConditionStatus::parse(&self.status)
    }
}

/// Log level of the pod placement operands.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum LogVerbosity {
    #[default]
    Normal,
    Debug,
    Trace,
    TraceAll,
}

impl LogVerbosity {
    /// `tracing` filter directive the operands should run with.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            LogVerbosity::Normal => "info",
            LogVerbosity::Debug => "debug",
            LogVerbosity::Trace | LogVerbosity::TraceAll => "trace",
        }
    }
}

/// CPU architectures the pod placement operand can schedule for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Amd64,
    Arm64,
    Ppc64le,
    S390x,
}

/// Common behaviour of the configurable operand plugins.
pub trait BasePlugin {
    /// Whether the plugin is switched on.
    fn enabled(&self) -> bool;

    /// Stable plugin name.
    fn name(&self) -> &'static str;
}

/// Weight given to an architecture when scoring nodes.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeAffinityScoringPlatformTerm {
    /// Architecture the weight applies to.
    pub architecture: Architecture,

    /// Preference weight in the range 1-100.
    #[schemars(range(min = 1, max = 100))]
    pub weight: i32,
}

/// Adds preferred node affinity terms so pods favour some architectures.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeAffinityScoring {
    /// Enables the plugin.
    pub enabled: bool,

    /// Per-architecture weights. Architectures must not repeat.
    #[serde(default)]
    pub platforms: Vec<NodeAffinityScoringPlatformTerm>,
}

impl NodeAffinityScoring {
    pub const NAME: &'static str = "nodeAffinityScoring";

    /// Check that the platform terms are usable: weights within 1-100,
    /// no architecture listed twice, at least one term when enabled.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.platforms.is_empty() {
            return Err("nodeAffinityScoring is enabled but has no platforms".to_string());
        }
        let mut seen = Vec::with_capacity(self.platforms.len());
        for term in &self.platforms {
            if !(1..=100).contains(&term.weight) {
                return Err(format!(
                    "weight {} for {:?} is outside 1-100",
                    term.weight, term.architecture
                ));
            }
            if seen.contains(&term.architecture) {
                return Err(format!("architecture {:?} is listed twice", term.architecture));
            }
            seen.push(term.architecture);
        }
        Ok(())
    }
}

impl BasePlugin for NodeAffinityScoring {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Configurable plugins of the pod placement operand.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plugins {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_affinity_scoring: Option<NodeAffinityScoring>,
}

impl Plugins {
    /// All configured plugins, enabled or not.
    #[must_use]
    pub fn configured(&self) -> Vec<&dyn BasePlugin> {
        let mut plugins: Vec<&dyn BasePlugin> = Vec::new();
        if let Some(scoring) = &self.node_affinity_scoring {
            plugins.push(scoring);
        }
        plugins
    }

    /// Names of the enabled plugins.
    #[must_use]
    pub fn enabled_names(&self) -> Vec<&'static str> {
        self.configured()
            .into_iter()
            .filter(|p| p.enabled())
            .map(|p| p.name())
            .collect()
    }
}

/// `PodPlacementConfig` enables the architecture-aware pod placement operand.
///
/// Creating the object deploys the operand; deleting it tears the operand down.
///
/// # Example
///
/// ```yaml
/// apiVersion: multiarch.openshift.io/v1beta1
/// kind: PodPlacementConfig
/// metadata:
///   name: cluster
///   namespace: openshift-multiarch-tuning-operator
/// spec:
///   logVerbosity: Normal
///   namespaceSelector:
///     matchExpressions:
///       - key: multiarch.openshift.io/exclude-pod-placement
///         operator: DoesNotExist
///   plugins:
///     nodeAffinityScoring:
///       enabled: true
///       platforms:
///         - architecture: arm64
///           weight: 50
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "multiarch.openshift.io",
    version = "v1beta1",
    kind = "PodPlacementConfig",
    namespaced,
    shortname = "ppc",
    doc = "PodPlacementConfig enables the architecture aware pod placement operand and reports whether it is available, progressing, degraded or being deprovisioned.",
    printcolumn = r#"{"name":"Available","type":"string","jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#,
    printcolumn = r#"{"name":"Progressing","type":"string","jsonPath":".status.conditions[?(@.type==\"Progressing\")].status"}"#,
    printcolumn = r#"{"name":"Degraded","type":"string","jsonPath":".status.conditions[?(@.type==\"Degraded\")].status"}"#,
    printcolumn = r#"{"name":"Since","type":"date","jsonPath":".status.conditions[?(@.type==\"Progressing\")].lastTransitionTime"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.conditions[?(@.type==\"Available\")].reason"}"#
)]
#[kube(status = "PodPlacementConfigStatus")]
#[serde(rename_all = "camelCase")]
pub struct PodPlacementConfigSpec {
    /// Log level for the pod placement components. Defaults to `Normal`.
    #[serde(default)]
    pub log_verbosity: LogVerbosity,

    /// Selects the namespaces whose pods the operand processes.
    /// If left empty, all namespaces are considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,

    /// Configurable plugins for the operand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Plugins>,

    /// Ordering hint when several configs select the same namespaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// `PodPlacementConfig` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodPlacementConfigStatus {
    /// Latest observations of the operand's state, one entry per condition type.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl PodPlacementConfigStatus {
    /// Find the stored condition for a key.
    #[must_use]
    pub fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.r#type == condition_type.as_str())
    }

    /// Whether the stored condition for a key is `True`.
    #[must_use]
    pub fn is_true(&self, condition_type: ConditionType) -> bool {
        self.condition(condition_type)
            .is_some_and(|c| c.condition_status() == ConditionStatus::True)
    }

    /// Derive the conditions for `snapshot` and merge them into this status.
    ///
    /// Transition timestamps move to `now` only for conditions whose status changed.
    pub fn build(&mut self, snapshot: &ReadinessSnapshot, now: DateTime<Utc>) -> DerivedFlags {
        let report = readiness::derive(snapshot);
        self.conditions = readiness::materialize(&self.conditions, &report, now);
        report.flags
    }
}
