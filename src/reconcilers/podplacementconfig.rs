// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `PodPlacementConfig` reconciliation logic.
//!
//! Each pass observes the two operand Deployments and the webhook configuration,
//! reduces them to a [`ReadinessSnapshot`], derives the status conditions and
//! persists them, then acts on the derived gating flags:
//!
//! 1. Register (or refresh) the `MutatingWebhookConfiguration` when the controller
//!    and the webhook both have available replicas.
//! 2. When the config is being deleted, remove the webhook configuration so no new
//!    pods get gated, and only then drop the finalizer. The operand Deployments are
//!    observed but never created or deleted here.
//!
//! Only one config, named `cluster` in the operator namespace, is acted on. The
//! webhook configuration is a cluster-wide singleton, so any other config is
//! ignored.

use crate::constants::{
    KIND_DEPLOYMENT, KIND_POD_PLACEMENT_CONFIG, POD_PLACEMENT_CONFIG_FINALIZER,
    POD_PLACEMENT_CONFIG_NAME, REQUEUE_WHEN_NOT_READY_SECS, REQUEUE_WHEN_READY_SECS,
};
use crate::context::{Context, OperatorConfig};
use crate::crd::PodPlacementConfig;
use crate::metrics;
use crate::readiness::{DerivedFlags, ReadinessSnapshot};
use crate::reconcilers::finalizers::{
    ensure_finalizer, handle_deletion, remove_finalizer, FinalizerCleanup,
};
use crate::reconcilers::status::PodPlacementConfigStatusUpdater;
use crate::reconcilers::webhook::{
    delete_webhook_configuration, ensure_webhook_configuration, webhook_configuration_exists,
    DeleteOutcome,
};
use anyhow::{Context as _, Result};
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, ResourceExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Availability and roll-out state of one operand Deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentReadiness {
    pub available: bool,
    pub up_to_date: bool,
}

impl ComponentReadiness {
    /// Readiness of an optional Deployment; a missing Deployment is neither
    /// available nor up to date.
    #[must_use]
    pub fn of(deployment: Option<&Deployment>) -> Self {
        deployment.map_or_else(Self::default, |d| Self {
            available: deployment_available(d),
            up_to_date: deployment_up_to_date(d),
        })
    }
}

/// A Deployment is available when at least one replica is available.
#[must_use]
pub fn deployment_available(deployment: &Deployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.available_replicas)
        .unwrap_or(0)
        >= 1
}

/// A Deployment is up to date when its controller observed the latest
/// generation and every desired replica runs the updated template and is available.
#[must_use]
pub fn deployment_up_to_date(deployment: &Deployment) -> bool {
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };

    let generation = deployment.metadata.generation.unwrap_or(0);
    let observed = status.observed_generation.unwrap_or(0);
    // Deployments default to one replica when unset
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let updated = status.updated_replicas.unwrap_or(0);
    let available = status.available_replicas.unwrap_or(0);
    let unavailable = status.unavailable_replicas.unwrap_or(0);
    let total = status.replicas.unwrap_or(0);

    observed >= generation
        && updated == desired
        && total == updated
        && available == updated
        && unavailable == 0
}

/// Combine observed facts into a readiness snapshot.
#[must_use]
pub fn build_snapshot(
    controller: Option<&Deployment>,
    webhook: Option<&Deployment>,
    config_registered: bool,
    deprovisioning: bool,
) -> ReadinessSnapshot {
    let controller = ComponentReadiness::of(controller);
    let webhook = ComponentReadiness::of(webhook);

    ReadinessSnapshot {
        controller_available: controller.available,
        webhook_available: webhook.available,
        controller_up_to_date: controller.up_to_date,
        webhook_up_to_date: webhook.up_to_date,
        config_registered,
        deprovisioning,
    }
}

/// Read the operand objects and build the readiness snapshot for `config`.
///
/// # Errors
///
/// Returns an error if a lookup fails for a reason other than not found.
pub async fn collect_snapshot(
    ctx: &Context,
    config: &PodPlacementConfig,
) -> Result<ReadinessSnapshot> {
    let namespace = &ctx.config.namespace;
    let api: Api<Deployment> = Api::namespaced(ctx.client.clone(), namespace);

    let controller = api
        .get_opt(&ctx.config.controller_deployment)
        .await
        .with_context(|| {
            format!(
                "failed to read {KIND_DEPLOYMENT} {namespace}/{}",
                ctx.config.controller_deployment
            )
        })?;
    let webhook = api
        .get_opt(&ctx.config.webhook_deployment)
        .await
        .with_context(|| {
            format!(
                "failed to read {KIND_DEPLOYMENT} {namespace}/{}",
                ctx.config.webhook_deployment
            )
        })?;
    let config_registered = webhook_configuration_exists(&ctx.client).await?;

    let snapshot = build_snapshot(
        controller.as_ref(),
        webhook.as_ref(),
        config_registered,
        config.metadata.deletion_timestamp.is_some(),
    );
    debug!(?snapshot, "Collected readiness snapshot for {}", config.name_any());
    Ok(snapshot)
}

/// How long to wait before the next reconciliation.
#[must_use]
pub fn requeue_interval(flags: &DerivedFlags) -> Duration {
    if flags.available && !flags.progressing && !flags.deprovisioning {
        Duration::from_secs(REQUEUE_WHEN_READY_SECS)
    } else {
        Duration::from_secs(REQUEUE_WHEN_NOT_READY_SECS)
    }
}

/// Whether `config` is the single `PodPlacementConfig` the operator acts on.
///
/// The webhook configuration and the operand Deployments are shared, so only
/// the config named [`POD_PLACEMENT_CONFIG_NAME`] in the operator namespace
/// drives them. Any other config is ignored.
#[must_use]
pub fn is_managed_config(config: &PodPlacementConfig, operator: &OperatorConfig) -> bool {
    config.name_any() == POD_PLACEMENT_CONFIG_NAME
        && config.namespace().as_deref() == Some(operator.namespace.as_str())
}

/// Metric action to record after applying the webhook configuration.
///
/// Only the first registration counts; re-applying an existing object does not.
#[must_use]
pub fn registration_action(config_registered: bool) -> Option<&'static str> {
    (!config_registered).then_some("created")
}

#[async_trait::async_trait]
impl FinalizerCleanup for PodPlacementConfig {
    async fn cleanup(&self, ctx: &Context) -> Result<bool> {
        info!(
            "Tearing down pod placement operand for {}/{}",
            self.namespace().unwrap_or_default(),
            self.name_any()
        );

        // Stop gating new pods; the operand Deployments are not ours to remove
        let outcome = delete_webhook_configuration(&ctx.client).await?;
        if outcome == DeleteOutcome::Deleted {
            metrics::record_webhook_registration("deleted");
        }
        Ok(outcome.is_gone())
    }
}

/// Drop our finalizer from a config the operator does not act on.
async fn release_ignored_config(ctx: &Context, config: &PodPlacementConfig) -> Result<()> {
    warn!(
        "Ignoring {} {}/{}: only {}/{} is reconciled",
        KIND_POD_PLACEMENT_CONFIG,
        config.namespace().unwrap_or_default(),
        config.name_any(),
        ctx.config.namespace,
        POD_PLACEMENT_CONFIG_NAME
    );
    remove_finalizer(&ctx.client, config, POD_PLACEMENT_CONFIG_FINALIZER).await
}

/// Reconciles a `PodPlacementConfig` resource.
///
/// Returns the derived flags of this pass so the caller can pick a requeue
/// interval, or `None` when the config is not the one the operator acts on.
///
/// # Errors
///
/// Returns an error if reading operand state, patching the status, registering the
/// webhook configuration or tearing down fails.
pub async fn reconcile_podplacementconfig(
    ctx: &Context,
    config: &PodPlacementConfig,
) -> Result<Option<DerivedFlags>> {
    if !is_managed_config(config, &ctx.config) {
        release_ignored_config(ctx, config).await?;
        return Ok(None);
    }

    let namespace = config.namespace().unwrap_or_default();
    let name = config.name_any();
    let deprovisioning = config.metadata.deletion_timestamp.is_some();

    info!("Reconciling {} {}/{}", KIND_POD_PLACEMENT_CONFIG, namespace, name);

    let plugins = config.spec.plugins.clone().unwrap_or_default();
    debug!(
        "{}/{}: operand log filter {}, enabled plugins {:?}",
        namespace,
        name,
        config.spec.log_verbosity.as_filter(),
        plugins.enabled_names()
    );
    if let Some(scoring) = plugins.node_affinity_scoring.as_ref() {
        if let Err(reason) = scoring.validate() {
            warn!("{}/{}: invalid nodeAffinityScoring plugin: {}", namespace, name, reason);
        }
    }

    if !deprovisioning {
        ensure_finalizer(&ctx.client, config, POD_PLACEMENT_CONFIG_FINALIZER).await?;
    }

    let snapshot = collect_snapshot(ctx, config).await?;

    let mut updater = PodPlacementConfigStatusUpdater::new(config);
    let flags = updater.build(&snapshot, Utc::now());
    updater.apply(&ctx.client).await?;
    metrics::record_conditions(&namespace, &name, &updater.status().conditions);

    if flags.can_register_config {
        if !snapshot.config_registered {
            info!(
                "Controller and webhook are available, registering the webhook configuration for {}/{}",
                namespace, name
            );
        }
        ensure_webhook_configuration(&ctx.client, config, &ctx.config).await?;
        if let Some(action) = registration_action(snapshot.config_registered) {
            metrics::record_webhook_registration(action);
        }
    } else if !deprovisioning {
        debug!(
            "Webhook configuration not registered for {}/{}: controller or webhook unavailable",
            namespace, name
        );
    }

    if deprovisioning && handle_deletion(ctx, config, POD_PLACEMENT_CONFIG_FINALIZER).await? {
        info!("Teardown of {}/{} complete", namespace, name);
        metrics::forget_conditions(&namespace, &name, &updater.status().conditions);
    }

    Ok(Some(flags))
}
