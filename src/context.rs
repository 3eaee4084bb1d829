// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context and operator configuration for the controller.
//!
//! All reconciliations receive an `Arc<Context>` that contains:
//! - Kubernetes client
//! - Operator configuration (operand names, namespace, metrics address)

use crate::constants::{
    DEFAULT_CONTROLLER_DEPLOYMENT, DEFAULT_METRICS_BIND_ADDRESS, DEFAULT_OPERATOR_NAMESPACE,
    DEFAULT_WEBHOOK_DEPLOYMENT, DEFAULT_WEBHOOK_SERVICE,
};
use clap::Parser;
use kube::Client;

/// Operator configuration, read from flags with environment variable fallbacks.
#[derive(Clone, Debug, Parser, PartialEq, Eq)]
#[command(name = "podplacement-operator", version, about)]
pub struct OperatorConfig {
    /// Namespace the operand Deployments and the webhook Service live in
    #[arg(long, env = "POD_NAMESPACE", default_value = DEFAULT_OPERATOR_NAMESPACE)]
    pub namespace: String,

    /// Name of the pod placement controller Deployment
    #[arg(long, env = "CONTROLLER_DEPLOYMENT", default_value = DEFAULT_CONTROLLER_DEPLOYMENT)]
    pub controller_deployment: String,

    /// Name of the pod placement webhook Deployment
    #[arg(long, env = "WEBHOOK_DEPLOYMENT", default_value = DEFAULT_WEBHOOK_DEPLOYMENT)]
    pub webhook_deployment: String,

    /// Name of the Service fronting the webhook
    #[arg(long, env = "WEBHOOK_SERVICE", default_value = DEFAULT_WEBHOOK_SERVICE)]
    pub webhook_service: String,

    /// Address the Prometheus metrics server binds to
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
            controller_deployment: DEFAULT_CONTROLLER_DEPLOYMENT.to_string(),
            webhook_deployment: DEFAULT_WEBHOOK_DEPLOYMENT.to_string(),
            webhook_service: DEFAULT_WEBHOOK_SERVICE.to_string(),
            metrics_bind_address: DEFAULT_METRICS_BIND_ADDRESS.to_string(),
        }
    }
}

/// Shared context passed to every reconciliation.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Operator configuration
    pub config: OperatorConfig,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        Self { client, config }
    }
}
