// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and operator-specific labels
//! to ensure consistency across all resources created by the controller.

use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture (e.g., "webhook")
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_MULTIARCH_TUNING: &str = "multiarch-tuning-operator";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_POD_PLACEMENT_CONFIG: &str = "PodPlacementConfig";

/// Component value for the admission webhook
pub const COMPONENT_WEBHOOK: &str = "pod-placement-web-hook";

/// Application name for the pod placement operand
pub const APP_NAME_POD_PLACEMENT: &str = "pod-placement";

/// Build the standard label set for an object owned by a `PodPlacementConfig`.
#[must_use]
pub fn operand_labels(component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_NAME.to_string(), APP_NAME_POD_PLACEMENT.to_string()),
        (K8S_COMPONENT.to_string(), component.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_MULTIARCH_TUNING.to_string()),
        (
            K8S_MANAGED_BY.to_string(),
            MANAGED_BY_POD_PLACEMENT_CONFIG.to_string(),
        ),
    ])
}
