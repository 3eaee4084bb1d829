// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Readiness aggregation for the pod placement operand.
//!
//! The operand is made of three independently deployed pieces: the pod placement
//! controller, the admission webhook, and the `MutatingWebhookConfiguration` that
//! registers the webhook with the API server. The reconciler observes each of them
//! and reduces what it sees to a [`ReadinessSnapshot`] of six booleans.
//!
//! [`derive`] turns a snapshot into a [`StatusReport`]: the [`DerivedFlags`] other
//! reconciliation logic gates on, and one [`Condition`] per [`ConditionType`].
//! [`materialize`] merges a report into a stored condition set, moving transition
//! timestamps only for conditions whose status flipped.
//!
//! # Derivation Rules
//!
//! - `controller_not_ready = !controller_available || !controller_up_to_date`
//! - `webhook_not_ready = !webhook_available || !webhook_up_to_date`
//! - `config_not_available = !config_registered`
//! - `available = config_registered && webhook_available && controller_available`
//! - `degraded = !available && !deprovisioning`
//! - `can_register_config = webhook_available && controller_available && !deprovisioning`
//! - `progressing = (!controller_up_to_date || !webhook_up_to_date || !config_registered) && !deprovisioning`
//!
//! A stale replica still serves traffic, so up-to-dateness never gates availability.
//! A teardown is never reported as degraded nor as progressing.
//!
//! # Example
//!
//! ```rust
//! use podplacement::readiness::{derive, ReadinessSnapshot};
//!
//! let snapshot = ReadinessSnapshot {
//!     controller_available: true,
//!     webhook_available: true,
//!     controller_up_to_date: true,
//!     webhook_up_to_date: true,
//!     config_registered: false,
//!     deprovisioning: false,
//! };
//!
//! let report = derive(&snapshot);
//! assert!(report.flags.can_register_config);
//! assert!(report.flags.progressing);
//! assert!(!report.flags.available);
//! ```

use crate::crd::Condition;
use crate::reconcilers::status::set_condition_in_place;
use crate::status_reasons::{
    available_message, controller_rolled_out_message, degraded_message, deprovisioning_message,
    progressing_message, rollout_reason, state_reason, webhook_configuration_message,
    webhook_rolled_out_message, ConditionStatus, ConditionType, REASON_ALL_COMPONENTS_READY,
    REASON_PREFIX_CONTROLLER, REASON_PREFIX_WEBHOOK, REASON_SEPARATOR,
};
use chrono::{DateTime, Utc};

/// Raw readiness facts gathered by the reconciler on every pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReadinessSnapshot {
    /// At least one controller replica is available.
    pub controller_available: bool,
    /// At least one webhook replica is available.
    pub webhook_available: bool,
    /// The controller's ready replicas run the latest desired generation.
    pub controller_up_to_date: bool,
    /// The webhook's ready replicas run the latest desired generation.
    pub webhook_up_to_date: bool,
    /// The `MutatingWebhookConfiguration` exists.
    pub config_registered: bool,
    /// The owning `PodPlacementConfig` is being deleted.
    pub deprovisioning: bool,
}

/// Flags derived from a [`ReadinessSnapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivedFlags {
    pub available: bool,
    pub progressing: bool,
    pub degraded: bool,
    pub deprovisioning: bool,
    pub controller_not_ready: bool,
    pub webhook_not_ready: bool,
    pub config_not_available: bool,
    /// Safe to create or update the `MutatingWebhookConfiguration`.
    pub can_register_config: bool,
}

impl DerivedFlags {
    #[must_use]
    pub fn from_snapshot(s: &ReadinessSnapshot) -> Self {
        let available = s.config_registered && s.webhook_available && s.controller_available;
        Self {
            available,
            progressing: (!s.controller_up_to_date
                || !s.webhook_up_to_date
                || !s.config_registered)
                && !s.deprovisioning,
            degraded: !available && !s.deprovisioning,
            deprovisioning: s.deprovisioning,
            controller_not_ready: !s.controller_available || !s.controller_up_to_date,
            webhook_not_ready: !s.webhook_available || !s.webhook_up_to_date,
            config_not_available: !s.config_registered,
            can_register_config: s.webhook_available
                && s.controller_available
                && !s.deprovisioning,
        }
    }

    /// Tokens naming the components that are not ready, in fixed order.
    #[must_use]
    pub fn reason_tokens(&self) -> Vec<&'static str> {
        [
            (self.controller_not_ready, ConditionType::ControllerNotRolledOut),
            (self.webhook_not_ready, ConditionType::WebhookNotRolledOut),
            (self.config_not_available, ConditionType::ConfigNotAvailable),
        ]
        .into_iter()
        .filter_map(|(applies, condition_type)| applies.then_some(condition_type.as_str()))
        .collect()
    }

    /// Reason shared by the `Available`, `Progressing` and webhook configuration conditions.
    #[must_use]
    pub fn composite_reason(&self) -> String {
        let tokens = self.reason_tokens();
        if tokens.is_empty() {
            REASON_ALL_COMPONENTS_READY.to_string()
        } else {
            tokens.join(REASON_SEPARATOR)
        }
    }
}

/// Output of [`derive`]: the flags plus one untimestamped condition per key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub flags: DerivedFlags,
    pub conditions: Vec<Condition>,
}

fn condition(
    condition_type: ConditionType,
    status: bool,
    reason: String,
    message: String,
) -> Condition {
    Condition {
        r#type: condition_type.as_str().to_string(),
        status: ConditionStatus::from(status).as_str().to_string(),
        reason: Some(reason),
        message: Some(message),
        last_transition_time: None,
    }
}

/// Derive flags and conditions from a readiness snapshot.
#[must_use]
pub fn derive(snapshot: &ReadinessSnapshot) -> StatusReport {
    let flags = DerivedFlags::from_snapshot(snapshot);
    let reason = flags.composite_reason();

    let conditions = ConditionType::ALL
        .into_iter()
        .map(|condition_type| match condition_type {
            ConditionType::Available => condition(
                condition_type,
                flags.available,
                reason.clone(),
                available_message(flags.available),
            ),
            ConditionType::Progressing => condition(
                condition_type,
                flags.progressing,
                reason.clone(),
                progressing_message(flags.progressing),
            ),
            ConditionType::Degraded => condition(
                condition_type,
                flags.degraded,
                state_reason(flags.degraded, condition_type),
                degraded_message(flags.degraded),
            ),
            ConditionType::Deprovisioning => condition(
                condition_type,
                flags.deprovisioning,
                state_reason(flags.deprovisioning, condition_type),
                deprovisioning_message(flags.deprovisioning),
            ),
            ConditionType::ControllerNotRolledOut => condition(
                condition_type,
                flags.controller_not_ready,
                rollout_reason(REASON_PREFIX_CONTROLLER, !flags.controller_not_ready),
                controller_rolled_out_message(!flags.controller_not_ready),
            ),
            ConditionType::WebhookNotRolledOut => condition(
                condition_type,
                flags.webhook_not_ready,
                rollout_reason(REASON_PREFIX_WEBHOOK, !flags.webhook_not_ready),
                webhook_rolled_out_message(!flags.webhook_not_ready),
            ),
            ConditionType::ConfigNotAvailable => condition(
                condition_type,
                flags.config_not_available,
                reason.clone(),
                webhook_configuration_message(!flags.config_not_available),
            ),
        })
        .collect();

    StatusReport { flags, conditions }
}

/// Merge a report into an existing condition set.
///
/// Existing entries keep their position and, when their status is unchanged,
/// their transition timestamp. Missing keys are appended with `now`.
#[must_use]
pub fn materialize(
    existing: &[Condition],
    report: &StatusReport,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let mut conditions = existing.to_vec();
    for condition in &report.conditions {
        set_condition_in_place(&mut conditions, condition.clone(), now);
    }
    conditions
}
