// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `PodPlacementConfig` resources.
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `PodPlacementConfig`s, the operand Deployments and the
//!    webhook configuration
//! 2. **Observe** - Reduce what is running to a readiness snapshot
//! 3. **Derive** - Compute status conditions and gating flags from the snapshot
//! 4. **Act** - Register the webhook configuration, or tear the operand down
//! 5. **Status** - Report the derived conditions back to Kubernetes
//!
//! # Modules
//!
//! - [`podplacementconfig`] - The reconciler itself
//! - [`status`] - Keyed condition-set updates and status persistence
//! - [`webhook`] - `MutatingWebhookConfiguration` registration
//! - [`finalizers`] - Finalizer handling for teardown
//!
//! # Example
//!
//! ```rust,no_run
//! use podplacement::context::Context;
//! use podplacement::crd::PodPlacementConfig;
//! use podplacement::reconcilers::reconcile_podplacementconfig;
//!
//! async fn reconcile(ctx: &Context, config: &PodPlacementConfig) -> anyhow::Result<()> {
//!     if let Some(flags) = reconcile_podplacementconfig(ctx, config).await? {
//!         println!("available: {}", flags.available);
//!     }
//!     Ok(())
//! }
//! ```

pub mod finalizers;
pub mod podplacementconfig;
pub mod status;
pub mod webhook;


pub use podplacementconfig::reconcile_podplacementconfig;
