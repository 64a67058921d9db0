// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::{apps::v1::StatefulSet, core::v1::Service};
use kube::{
    runtime::{controller::Action, watcher::Config as WatcherConfig, Controller},
    Api, Client, Resource,
};
use rethinkdb_operator::{
    api_errors::ReconcileError,
    config::{Config, LogFormat},
    constants::{ERROR_REQUEUE_DURATION_SECS, RESYNC_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS},
    context::Context,
    crd::RethinkDBCluster,
    health::run_health_server,
    metrics::{record_error, record_reconciliation_error, record_reconciliation_success},
    reconcilers::Reconcilable,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    let config = Config::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("rethinkdb-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

/// Initialize logging.
///
/// Format: timestamp file:line LEVEL message
///
/// Respects `RUST_LOG` if set, otherwise defaults to INFO level.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
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

async fn async_main(config: Config) -> Result<()> {
    init_tracing(config.log_format);

    info!("Starting RethinkDB Operator");
    debug!(?config, "Configuration loaded");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let watch_namespace = config.watch_namespace();
    match &watch_namespace {
        Some(ns) => info!("Watching namespace {}", ns),
        None => info!("Watching all namespaces"),
    }

    let ctx = Arc::new(Context::from_client(client.clone(), watch_namespace));
    let metrics_addr = config.metrics_addr()?;

    tokio::select! {
        result = run_rethinkdbcluster_controller(client, ctx) => {
            result?;
            info!("Controller stopped, shutting down");
            Ok(())
        }
        result = run_health_server(metrics_addr) => {
            error!("CRITICAL: health server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Health server exited unexpectedly without error")
        }
    }
}

/// Scope an API handle to the watched namespace, or the whole cluster.
fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the `RethinkDBCluster` controller until a shutdown signal arrives
async fn run_rethinkdbcluster_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting RethinkDBCluster controller");

    let namespace = ctx.watch_namespace.clone();
    let clusters = scoped_api::<RethinkDBCluster>(client.clone(), namespace.as_deref());
    let statefulsets = scoped_api::<StatefulSet>(client.clone(), namespace.as_deref());
    let services = scoped_api::<Service>(client, namespace.as_deref());

    Controller::new(clusters, WatcherConfig::default())
        .owns(statefulsets, WatcherConfig::default())
        .owns(services, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile_rethinkdbcluster_wrapper, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!("Reconciled {}", obj.name),
                Err(e) => warn!("Reconcile failed: {}", e),
            }
        })
        .await;

    Ok(())
}

/// Reconcile wrapper for `RethinkDBCluster`
async fn reconcile_rethinkdbcluster_wrapper(
    cluster: Arc<RethinkDBCluster>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let event = Reconcilable::from(cluster);
    let start = Instant::now();

    debug!(object = %event.object_ref(), "Reconcile wrapper called for RethinkDBCluster");

    match event.reconcile(&ctx).await {
        Ok(()) => {
            record_reconciliation_success(event.kind(), start.elapsed());
            info!("Successfully reconciled RethinkDBCluster: {}", event.object_ref());
            Ok(Action::requeue(Duration::from_secs(
                RESYNC_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            record_reconciliation_error(event.kind(), start.elapsed());
            record_error(event.kind(), e.error_type());
            error!("Failed to reconcile RethinkDBCluster {}: {}", event.object_ref(), e);
            Err(e)
        }
    }
}

/// Error policy for controller
fn error_policy(
    _resource: Arc<RethinkDBCluster>,
    _err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
