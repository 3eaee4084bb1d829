// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced custom resources.
//!
//! A finalizer keeps a `PodPlacementConfig` around after deletion was requested,
//! until the operand it enabled has been torn down. Teardown may take several
//! reconciliations (objects are deleted asynchronously), so cleanup reports
//! whether it has finished and the finalizer is only dropped once it has.
//!
//! # Example
//!
//! ```rust,ignore
//! use podplacement::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
//!
//! async fn reconcile(ctx: Context, config: PodPlacementConfig) -> Result<()> {
//!     if config.metadata.deletion_timestamp.is_some() {
//!         return handle_deletion(&ctx, &config, FINALIZER).await.map(|_| ());
//!     }
//!     ensure_finalizer(&ctx.client, &config, FINALIZER).await?;
//!     Ok(())
//! }
//! ```

use crate::context::Context;
use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// Trait for resources that must tear something down before they disappear.
#[async_trait::async_trait]
pub trait FinalizerCleanup: Resource + ResourceExt + Clone {
    /// Make progress on the teardown.
    ///
    /// Returns `Ok(true)` once nothing is left to clean up. Returning `Ok(false)`
    /// keeps the finalizer in place until a later reconciliation.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete or lookup against the API fails.
    async fn cleanup(&self, ctx: &Context) -> Result<bool>;
}

/// Whether `finalizer` is present on `resource`.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

/// The finalizer list of `resource` with `finalizer` appended (if missing).
#[must_use]
pub fn finalizers_with<T: Resource>(resource: &T, finalizer: &str) -> Vec<String> {
    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    if !finalizers.iter().any(|f| f == finalizer) {
        finalizers.push(finalizer.to_string());
    }
    finalizers
}

/// The finalizer list of `resource` with every occurrence of `finalizer` removed.
#[must_use]
pub fn finalizers_without<T: Resource>(resource: &T, finalizer: &str) -> Vec<String> {
    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer);
    finalizers
}

async fn patch_finalizers<T>(client: &Client, resource: &T, finalizers: Vec<String>) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(
        &resource.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }

    info!(
        "Adding finalizer {} to {} {}/{}",
        finalizer,
        T::kind(&()),
        resource.namespace().unwrap_or_default(),
        resource.name_any()
    );
    patch_finalizers(client, resource, finalizers_with(resource, finalizer)).await
}

/// Remove a finalizer from a resource if present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }

    info!(
        "Removing finalizer {} from {} {}/{}",
        finalizer,
        T::kind(&()),
        resource.namespace().unwrap_or_default(),
        resource.name_any()
    );
    patch_finalizers(client, resource, finalizers_without(resource, finalizer)).await
}

/// Run one teardown step and drop the finalizer once cleanup is complete.
///
/// Returns `true` when the finalizer was removed (or was already absent).
///
/// # Errors
///
/// Returns an error if cleanup or the finalizer patch fails. The finalizer
/// then stays in place and deletion stays blocked until a later attempt succeeds.
pub async fn handle_deletion<T>(ctx: &Context, resource: &T, finalizer: &str) -> Result<bool>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + FinalizerCleanup
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(true);
    }

    if !resource.cleanup(ctx).await? {
        debug!(
            "Cleanup of {} {}/{} still in progress",
            T::kind(&()),
            resource.namespace().unwrap_or_default(),
            resource.name_any()
        );
        return Ok(false);
    }

    remove_finalizer(&ctx.client, resource, finalizer).await?;
    Ok(true)
}
