// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Registration of the pod placement admission webhook.
//!
//! The webhook only starts receiving admission reviews once a
//! `MutatingWebhookConfiguration` points the API server at it. Registering it
//! before the controller and the webhook have available replicas would gate pods
//! nobody is going to release, so the reconciler only calls
//! [`ensure_webhook_configuration`] when the derived `can_register_config` flag is set.
//!
//! The configuration is cluster scoped and cannot be owned by the namespaced
//! `PodPlacementConfig`; it is deleted explicitly during teardown.

use crate::constants::{
    FIELD_MANAGER, INJECT_CABUNDLE_ANNOTATION, KIND_MUTATING_WEBHOOK_CONFIGURATION,
    MUTATING_WEBHOOK_CONFIGURATION_NAME, MUTATING_WEBHOOK_NAME, MUTATING_WEBHOOK_PATH,
    WEBHOOK_SERVICE_PORT, WEBHOOK_TIMEOUT_SECS,
};
use crate::context::OperatorConfig;
use crate::crd::PodPlacementConfig;
use crate::labels::{operand_labels, COMPONENT_WEBHOOK};
use anyhow::{Context as _, Result};
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, RuleWithOperations, ServiceReference,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, Patch, PatchParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Build the `MutatingWebhookConfiguration` registering the scheduling-gate webhook.
///
/// The webhook intercepts pod creation in the namespaces selected by the config's
/// `namespaceSelector` (all namespaces when unset). It fails open so an
/// unavailable webhook never blocks pod creation.
#[must_use]
pub fn build_mutating_webhook_configuration(
    config: &PodPlacementConfig,
    operator: &OperatorConfig,
) -> MutatingWebhookConfiguration {
    let webhook = MutatingWebhook {
        name: MUTATING_WEBHOOK_NAME.to_string(),
        admission_review_versions: vec!["v1".to_string()],
        client_config: WebhookClientConfig {
            service: Some(ServiceReference {
                name: operator.webhook_service.clone(),
                namespace: operator.namespace.clone(),
                path: Some(MUTATING_WEBHOOK_PATH.to_string()),
                port: Some(WEBHOOK_SERVICE_PORT),
            }),
            ..Default::default()
        },
        failure_policy: Some("Ignore".to_string()),
        side_effects: "None".to_string(),
        timeout_seconds: Some(WEBHOOK_TIMEOUT_SECS),
        namespace_selector: config.spec.namespace_selector.clone(),
        rules: Some(vec![RuleWithOperations {
            api_groups: Some(vec![String::new()]),
            api_versions: Some(vec!["v1".to_string()]),
            operations: Some(vec!["CREATE".to_string()]),
            resources: Some(vec!["pods".to_string()]),
            scope: Some("Namespaced".to_string()),
        }]),
        ..Default::default()
    };

    MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(MUTATING_WEBHOOK_CONFIGURATION_NAME.to_string()),
            labels: Some(operand_labels(COMPONENT_WEBHOOK)),
            annotations: Some(BTreeMap::from([(
                INJECT_CABUNDLE_ANNOTATION.to_string(),
                "true".to_string(),
            )])),
            ..Default::default()
        },
        webhooks: Some(vec![webhook]),
    }
}

/// Whether the webhook configuration currently exists.
///
/// # Errors
///
/// Returns an error if the lookup fails for any reason other than not found.
pub async fn webhook_configuration_exists(client: &Client) -> Result<bool> {
    let api: Api<MutatingWebhookConfiguration> = Api::all(client.clone());
    let existing = api
        .get_opt(MUTATING_WEBHOOK_CONFIGURATION_NAME)
        .await
        .with_context(|| {
            format!(
                "failed to read {KIND_MUTATING_WEBHOOK_CONFIGURATION} {MUTATING_WEBHOOK_CONFIGURATION_NAME}"
            )
        })?;
    Ok(existing.is_some())
}

/// Create or update the webhook configuration with server-side apply.
///
/// # Errors
///
/// Returns an error if the apply patch fails.
pub async fn ensure_webhook_configuration(
    client: &Client,
    config: &PodPlacementConfig,
    operator: &OperatorConfig,
) -> Result<()> {
    let desired = build_mutating_webhook_configuration(config, operator);
    let api: Api<MutatingWebhookConfiguration> = Api::all(client.clone());

    api.patch(
        MUTATING_WEBHOOK_CONFIGURATION_NAME,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&desired),
    )
    .await
    .with_context(|| {
        format!(
            "failed to apply {KIND_MUTATING_WEBHOOK_CONFIGURATION} {MUTATING_WEBHOOK_CONFIGURATION_NAME}"
        )
    })?;

    debug!(
        "Applied {} {}",
        KIND_MUTATING_WEBHOOK_CONFIGURATION, MUTATING_WEBHOOK_CONFIGURATION_NAME
    );
    Ok(())
}

/// Result of a delete call against the webhook configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This call removed the object.
    Deleted,
    /// The object still exists with a deletion timestamp.
    Pending,
    /// The object was already gone.
    Absent,
}

impl DeleteOutcome {
    /// Whether the object no longer exists.
    #[must_use]
    pub const fn is_gone(self) -> bool {
        !matches!(self, DeleteOutcome::Pending)
    }
}

/// Delete the webhook configuration.
///
/// # Errors
///
/// Returns an error if the delete call fails for any reason other than not found.
pub async fn delete_webhook_configuration(client: &Client) -> Result<DeleteOutcome> {
    let api: Api<MutatingWebhookConfiguration> = Api::all(client.clone());

    match api
        .delete(MUTATING_WEBHOOK_CONFIGURATION_NAME, &DeleteParams::default())
        .await
    {
        Ok(deleted) => {
            // Left means the object still exists with a deletion timestamp
            let outcome = if deleted.is_right() {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::Pending
            };
            info!(
                "Delete of {} {}: {:?}",
                KIND_MUTATING_WEBHOOK_CONFIGURATION, MUTATING_WEBHOOK_CONFIGURATION_NAME, outcome
            );
            Ok(outcome)
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!(
                "{} {} already deleted",
                KIND_MUTATING_WEBHOOK_CONFIGURATION, MUTATING_WEBHOOK_CONFIGURATION_NAME
            );
            Ok(DeleteOutcome::Absent)
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to delete {KIND_MUTATING_WEBHOOK_CONFIGURATION} {MUTATING_WEBHOOK_CONFIGURATION_NAME}"
            )
        }),
    }
}
