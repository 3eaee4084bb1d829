// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::admissionregistration::v1::MutatingWebhookConfiguration;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    runtime::{
        controller::Action,
        reflector::ObjectRef,
        watcher::Config,
        Controller,
    },
    Api, Client, ResourceExt,
};
use podplacement::{
    constants::{
        ERROR_REQUEUE_DURATION_SECS, KIND_POD_PLACEMENT_CONFIG,
        MUTATING_WEBHOOK_CONFIGURATION_NAME, METRICS_SERVER_PATH, POD_PLACEMENT_CONFIG_NAME,
        TOKIO_WORKER_THREADS,
    },
    context::{Context, OperatorConfig},
    crd::PodPlacementConfig,
    metrics,
    reconcilers::{podplacementconfig::requeue_interval, reconcile_podplacementconfig},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let config = OperatorConfig::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("podplacement-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

fn init_tracing() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(config: OperatorConfig) -> Result<()> {
    init_tracing();

    info!("Starting pod placement operator");
    debug!(?config, "Operator configuration loaded");

    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let metrics_address = config.metrics_bind_address.clone();
    let ctx = Arc::new(Context::new(client, config));

    tokio::select! {
        result = run_podplacementconfig_controller(ctx) => {
            error!("CRITICAL: PodPlacementConfig controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("PodPlacementConfig controller exited unexpectedly without error")
        }
        result = run_metrics_server(metrics_address) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping");
            Ok(())
        }
    }
}

/// Reference to the single `PodPlacementConfig` the operator acts on.
fn managed_config(namespace: &str) -> ObjectRef<PodPlacementConfig> {
    ObjectRef::new(POD_PLACEMENT_CONFIG_NAME).within(namespace)
}

/// Run the `PodPlacementConfig` controller
///
/// Besides the configs themselves, changes to the operand Deployments and to the
/// webhook configuration trigger a reconciliation of the managed config.
async fn run_podplacementconfig_controller(ctx: Arc<Context>) -> Result<()> {
    info!("Starting PodPlacementConfig controller");

    let client = ctx.client.clone();
    let api = Api::<PodPlacementConfig>::all(client.clone());
    let deployments = Api::<Deployment>::namespaced(client.clone(), &ctx.config.namespace);
    let webhook_configurations = Api::<MutatingWebhookConfiguration>::all(client);

    let managed = managed_config(&ctx.config.namespace);
    let webhook_managed = managed.clone();
    let operand_names = [
        ctx.config.controller_deployment.clone(),
        ctx.config.webhook_deployment.clone(),
    ];

    Controller::new(api, Config::default())
        .watches(deployments, Config::default(), move |deployment| {
            operand_names
                .contains(&deployment.name_any())
                .then(|| managed.clone())
        })
        .watches(
            webhook_configurations,
            Config::default().fields(&format!(
                "metadata.name={MUTATING_WEBHOOK_CONFIGURATION_NAME}"
            )),
            move |_| Some(webhook_managed.clone()),
        )
        .run(reconcile_podplacementconfig_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `PodPlacementConfig`
async fn reconcile_podplacementconfig_wrapper(
    config: Arc<PodPlacementConfig>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_podplacementconfig(&ctx, &config).await {
        Ok(None) => Ok(Action::await_change()),
        Ok(Some(flags)) => {
            metrics::record_reconciliation_success(KIND_POD_PLACEMENT_CONFIG, start.elapsed());
            info!(
                "Successfully reconciled PodPlacementConfig: {} (available={}, progressing={}, degraded={})",
                config.name_any(),
                flags.available,
                flags.progressing,
                flags.degraded
            );

            let interval = requeue_interval(&flags);
            metrics::record_reconciliation_requeue(
                KIND_POD_PLACEMENT_CONFIG,
                if flags.available { "available" } else { "not_available" },
            );
            debug!("Requeueing {} in {:?}", config.name_any(), interval);
            Ok(Action::requeue(interval))
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_POD_PLACEMENT_CONFIG, start.elapsed());
            metrics::record_error(KIND_POD_PLACEMENT_CONFIG, "reconcile_error");
            error!("Failed to reconcile PodPlacementConfig {}: {:#}", config.name_any(), e);
            Err(e.into())
        }
    }
}

/// Error policy for the controller
fn error_policy(
    config: Arc<PodPlacementConfig>,
    err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    warn!(
        "Requeueing PodPlacementConfig {} after error: {}",
        config.name_any(),
        err
    );
    metrics::record_reconciliation_requeue(KIND_POD_PLACEMENT_CONFIG, "error");
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Serve Prometheus metrics
async fn run_metrics_server(address: String) -> Result<()> {
    let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!("Serving metrics on {}{}", address, METRICS_SERVER_PATH);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to gather metrics: {e}"),
        ),
    }
}
