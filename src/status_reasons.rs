// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition types, reasons and messages reported on `PodPlacementConfig` resources.
//!
//! This module defines the vocabulary of the status conditions following Kubernetes
//! conventions. Condition types and reasons are programmatic identifiers in CamelCase;
//! messages are rendered English sentences built around a `not`-word so that a single
//! template covers both the affirmed and the negated state.
//!
//! # Condition Types
//!
//! Every `PodPlacementConfig` carries exactly one entry for each of the seven
//! [`ConditionType`]s, always in the same order:
//!
//! - `Available` - the controller, the webhook and the webhook configuration can serve
//! - `Progressing` - some component is rolling out toward a new desired state
//! - `Degraded` - the operand is unusable and not because it is being torn down
//! - `Deprovisioning` - the operand is being torn down
//! - `PodPlacementControllerNotRolledOut` - the controller is unavailable or stale
//! - `PodPlacementWebhookNotRolledOut` - the webhook is unavailable or stale
//! - `MutatingWebhookConfigurationNotAvailable` - the registration object is missing
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Available
//!       status: "False"
//!       reason: MutatingWebhookConfigurationNotAvailable
//!       message: "The pod placement operand is not ready. We cannot gate and place pods."
//!     - type: Degraded
//!       status: "True"
//!       reason: Degraded
//!       message: "The pod placement operand is degraded."
//! ```

use std::fmt;

// ============================================================================
// Condition Types
// ============================================================================

/// Wire name of the `Available` condition type.
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";

/// Wire name of the `Progressing` condition type.
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";

/// Wire name of the `Degraded` condition type.
pub const CONDITION_TYPE_DEGRADED: &str = "Degraded";

/// Wire name of the `Deprovisioning` condition type.
pub const CONDITION_TYPE_DEPROVISIONING: &str = "Deprovisioning";

/// Wire name of the controller roll-out condition type.
pub const CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT: &str = "PodPlacementControllerNotRolledOut";

/// Wire name of the webhook roll-out condition type.
pub const CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT: &str = "PodPlacementWebhookNotRolledOut";

/// Wire name of the webhook configuration condition type.
pub const CONDITION_TYPE_CONFIG_NOT_AVAILABLE: &str = "MutatingWebhookConfigurationNotAvailable";

/// The fixed set of condition keys reported on a `PodPlacementConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionType {
    Available,
    Progressing,
    Degraded,
    Deprovisioning,
    ControllerNotRolledOut,
    WebhookNotRolledOut,
    ConfigNotAvailable,
}

impl ConditionType {
    /// All condition types in the order they are materialized.
    pub const ALL: [ConditionType; 7] = [
        ConditionType::Available,
        ConditionType::Progressing,
        ConditionType::Degraded,
        ConditionType::Deprovisioning,
        ConditionType::ControllerNotRolledOut,
        ConditionType::WebhookNotRolledOut,
        ConditionType::ConfigNotAvailable,
    ];

    /// The `type` string written to the resource status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConditionType::Available => CONDITION_TYPE_AVAILABLE,
            ConditionType::Progressing => CONDITION_TYPE_PROGRESSING,
            ConditionType::Degraded => CONDITION_TYPE_DEGRADED,
            ConditionType::Deprovisioning => CONDITION_TYPE_DEPROVISIONING,
            ConditionType::ControllerNotRolledOut => CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT,
            ConditionType::WebhookNotRolledOut => CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT,
            ConditionType::ConfigNotAvailable => CONDITION_TYPE_CONFIG_NOT_AVAILABLE,
        }
    }

    /// Look up a condition type by its wire name.
    #[must_use]
    pub fn from_type_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Condition Status
// ============================================================================

/// Tri-state condition status as defined by the Kubernetes API conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }

    /// Parse a status string; anything other than `True`/`False` is `Unknown`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reasons
// ============================================================================

/// Composite reason used when no component reports a problem.
pub const REASON_ALL_COMPONENTS_READY: &str = "AllComponentsReady";

/// Separator placed between the tokens of a composite reason.
///
/// `,` is part of the character set Kubernetes accepts in condition reasons.
pub const REASON_SEPARATOR: &str = ",";

/// Prefix of the controller roll-out condition's own reason.
pub const REASON_PREFIX_CONTROLLER: &str = "PodPlacementController";

/// Prefix of the webhook roll-out condition's own reason.
pub const REASON_PREFIX_WEBHOOK: &str = "PodPlacementWebhook";

/// Suffix of the controller/webhook roll-out conditions' own reasons.
pub const REASON_SUFFIX_READY: &str = "Ready";

// ============================================================================
// Messages
// ============================================================================

/// Appended to the `Deprovisioning` message while a teardown is pending.
pub const PENDING_DEPROVISIONING_MSG: &str =
    "Pending removal of the mutating webhook configuration.";

/// Render a boolean as the `not`-word used in condition messages.
///
/// Returns `" "` for `true` and `" not "` for `false`, so that `"is{}ready"`
/// reads `"is ready"` or `"is not ready"`.
#[must_use]
pub const fn not_from_bool(value: bool) -> &'static str {
    if value {
        " "
    } else {
        " not "
    }
}

/// Trim surrounding whitespace and upper-case the first character.
///
/// Only the first character is touched; the rest keeps its casing. Empty or
/// all-whitespace input yields an empty string.
///
/// ```
/// use podplacement::status_reasons::trim_and_capitalize;
///
/// assert_eq!(trim_and_capitalize(" not "), "Not");
/// assert_eq!(trim_and_capitalize(" "), "");
/// assert_eq!(trim_and_capitalize("nOT"), "NOT");
/// ```
#[must_use]
pub fn trim_and_capitalize(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reason of a condition whose own state is rendered before its key,
/// e.g. `Degraded` / `NotDegraded`.
#[must_use]
pub fn state_reason(state: bool, condition_type: ConditionType) -> String {
    format!(
        "{}{}",
        trim_and_capitalize(not_from_bool(state)),
        condition_type.as_str()
    )
}

/// Reason of a roll-out condition, e.g. `PodPlacementControllerNotReady`.
#[must_use]
pub fn rollout_reason(prefix: &str, ready: bool) -> String {
    format!(
        "{prefix}{}{REASON_SUFFIX_READY}",
        trim_and_capitalize(not_from_bool(ready))
    )
}

#[must_use]
pub fn available_message(available: bool) -> String {
    let word = not_from_bool(available);
    format!(
        "The pod placement operand is{word}ready. We can{} gate and place pods.",
        word.trim()
    )
}

#[must_use]
pub fn progressing_message(progressing: bool) -> String {
    format!(
        "The pod placement operand is{}progressing.",
        not_from_bool(progressing)
    )
}

#[must_use]
pub fn degraded_message(degraded: bool) -> String {
    format!(
        "The pod placement operand is{}degraded.",
        not_from_bool(degraded)
    )
}

/// The `Deprovisioning` message carries [`PENDING_DEPROVISIONING_MSG`] while tearing down.
#[must_use]
pub fn deprovisioning_message(deprovisioning: bool) -> String {
    let suffix = if deprovisioning {
        format!(" {PENDING_DEPROVISIONING_MSG}")
    } else {
        String::new()
    };
    format!(
        "The pod placement operand is{}being deprovisioned.{suffix}",
        not_from_bool(deprovisioning)
    )
}

#[must_use]
pub fn controller_rolled_out_message(ready: bool) -> String {
    format!(
        "The pod placement controller is{}fully rolled out.",
        not_from_bool(ready)
    )
}

#[must_use]
pub fn webhook_rolled_out_message(ready: bool) -> String {
    format!(
        "The pod placement webhook is{}fully rolled out.",
        not_from_bool(ready)
    )
}

#[must_use]
pub fn webhook_configuration_message(registered: bool) -> String {
    format!(
        "The mutating webhook configuration is{}available.",
        not_from_bool(registered)
    )
}
