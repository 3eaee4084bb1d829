// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `PodPlacementConfig` resources.
//!
//! This module provides the keyed condition-set primitive and the status updater
//! that persists a condition set back to Kubernetes.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Available", "Degraded")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//!
//! A condition set holds exactly one entry per `type`. Setting a condition replaces
//! the entry in place; its `lastTransitionTime` only moves when `status` changes.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use podplacement::crd::Condition;
//! use podplacement::reconcilers::status::set_condition;
//!
//! let degraded = Condition {
//!     r#type: "Degraded".to_string(),
//!     status: "True".to_string(),
//!     reason: Some("Degraded".to_string()),
//!     message: Some("The pod placement operand is degraded.".to_string()),
//!     last_transition_time: None,
//! };
//!
//! let conditions = set_condition(&[], degraded, Utc::now());
//! assert_eq!(conditions.len(), 1);
//! assert!(conditions[0].last_transition_time.is_some());
//! ```

use crate::crd::{Condition, PodPlacementConfig, PodPlacementConfigStatus};
use crate::readiness::{DerivedFlags, ReadinessSnapshot};
use anyhow::{Context as _, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Render a timestamp the way Kubernetes serializes `metav1.Time`.
#[must_use]
pub fn format_transition_time(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Set a condition in a condition list (in-memory, no API call).
///
/// If an entry with the same type exists and its status is unchanged, only the
/// reason and message are refreshed and the stored `lastTransitionTime` is kept.
/// If the status changed, or no entry exists, the condition is stored with `now`
/// as its transition time. Later duplicates of the same type are dropped so the
/// list always holds one entry per type.
pub fn set_condition_in_place(
    conditions: &mut Vec<Condition>,
    new_condition: Condition,
    now: DateTime<Utc>,
) {
    let condition_type = new_condition.r#type.clone();

    match conditions
        .iter()
        .position(|c| c.r#type == condition_type)
    {
        Some(index) => {
            let existing = &mut conditions[index];
            let last_transition_time = if existing.status == new_condition.status {
                existing
                    .last_transition_time
                    .take()
                    .unwrap_or_else(|| format_transition_time(now))
            } else {
                format_transition_time(now)
            };

            existing.status = new_condition.status;
            existing.reason = new_condition.reason;
            existing.message = new_condition.message;
            existing.last_transition_time = Some(last_transition_time);

            let mut seen = false;
            conditions.retain(|c| {
                if c.r#type != condition_type {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => {
            conditions.push(Condition {
                last_transition_time: Some(format_transition_time(now)),
                ..new_condition
            });
        }
    }
}

/// Pure form of [`set_condition_in_place`]: returns the updated list.
#[must_use]
pub fn set_condition(
    conditions: &[Condition],
    new_condition: Condition,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let mut updated = conditions.to_vec();
    set_condition_in_place(&mut updated, new_condition, now);
    updated
}

/// Compare two condition lists to check if they are semantically equal.
///
/// Ignores `lastTransitionTime` and ordering; compares type, status, reason and message.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        find_condition(current, &new_cond.r#type).is_some_and(|curr_cond| {
            curr_cond.status == new_cond.status
                && curr_cond.reason == new_cond.reason
                && curr_cond.message == new_cond.message
        })
    })
}

/// Centralized status updater for `PodPlacementConfig` resources.
///
/// Collects the derived condition set in memory and writes it in a single
/// Kubernetes API call, skipping the call when nothing changed.
///
/// # Example
///
/// ```rust,ignore
/// use podplacement::reconcilers::status::PodPlacementConfigStatusUpdater;
///
/// async fn reconcile(client: Client, config: PodPlacementConfig) -> Result<()> {
///     let mut updater = PodPlacementConfigStatusUpdater::new(&config);
///     let flags = updater.build(&snapshot, Utc::now());
///     updater.apply(&client).await?;
///     Ok(())
/// }
/// ```
pub struct PodPlacementConfigStatusUpdater {
    namespace: String,
    name: String,
    resource_version: Option<String>,
    current_status: Option<PodPlacementConfigStatus>,
    new_status: PodPlacementConfigStatus,
}

impl PodPlacementConfigStatusUpdater {
    /// Create a new status updater seeded with the resource's current status.
    #[must_use]
    pub fn new(config: &PodPlacementConfig) -> Self {
        let current_status = config.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: config.namespace().unwrap_or_default(),
            name: config.name_any(),
            resource_version: config.resource_version(),
            current_status,
            new_status,
        }
    }

    /// Derive conditions for `snapshot` and merge them into the pending status.
    pub fn build(&mut self, snapshot: &ReadinessSnapshot, now: DateTime<Utc>) -> DerivedFlags {
        self.new_status.build(snapshot, now)
    }

    /// The pending status.
    #[must_use]
    pub fn status(&self) -> &PodPlacementConfigStatus {
        &self.new_status
    }

    /// Check if the pending status differs semantically from the stored one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => !conditions_equal(&current.conditions, &self.new_status.conditions),
        }
    }

    /// Merge patch body for the pending status.
    ///
    /// Carries the `resourceVersion` the status was derived from, so the API
    /// server rejects the write with a conflict if the object changed since.
    #[must_use]
    pub fn status_patch(&self) -> serde_json::Value {
        let mut patch = json!({ "status": self.new_status });
        if let Some(resource_version) = &self.resource_version {
            patch["metadata"] = json!({ "resourceVersion": resource_version });
        }
        patch
    }

    /// Write the pending status to Kubernetes (single merge patch on `/status`).
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails, including a `409`
    /// conflict when the status was derived from a stale copy. The next
    /// reconciliation then starts from the stored status.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "PodPlacementConfig {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }

        let api: Api<PodPlacementConfig> = Api::namespaced(client.clone(), &self.namespace);
        let patch = self.status_patch();

        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| {
                format!(
                    "failed to patch status of PodPlacementConfig {}/{}",
                    self.namespace, self.name
                )
            })?;

        debug!(
            "Updated PodPlacementConfig {}/{} status: {} condition(s)",
            self.namespace,
            self.name,
            self.new_status.conditions.len()
        );

        Ok(())
    }
}
