// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `RethinkDBCluster` reconciliation logic.
//!
//! A reconcile pass is a straight sequence of independent, idempotent steps:
//!
//! 1. Apply spec defaults
//! 2. Ensure the headless cluster `Service` exists
//! 3. Ensure the driver `Service` exists
//! 4. Ensure the `StatefulSet` exists and has the desired replica count
//! 5. Refresh `status.servers` from the live pod list
//!
//! A failing step aborts the remaining ones. Objects created by earlier steps stay in
//! place and converge again on the next pass. There is no retry inside a pass; the
//! controller requeues on error.

use crate::api_errors::{ApiError, ReconcileError};
use crate::cluster_api::ClusterApi;
use crate::constants::{KIND_RETHINKDB_CLUSTER, KIND_SERVICE, KIND_STATEFUL_SET};
use crate::context::Context;
use crate::crd::RethinkDBCluster;
use crate::metrics::{record_resource_created, record_resource_updated, record_status_update};
use crate::reconcilers::status::{build_status, observed_servers, servers_changed};
use crate::rethinkdb_resources::{
    build_cluster_service, build_driver_service, build_label_selector, build_labels,
    build_statefulset,
};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, info};

/// Reconciles a `RethinkDBCluster` resource.
///
/// # Arguments
///
/// * `ctx` - Operator context holding the Kubernetes API handle
/// * `cluster` - The `RethinkDBCluster` resource to reconcile
///
/// # Example
///
/// ```rust,no_run
/// use rethinkdb_operator::context::Context;
/// use rethinkdb_operator::crd::RethinkDBCluster;
/// use rethinkdb_operator::reconcilers::reconcile_rethinkdbcluster;
///
/// async fn handle(ctx: &Context, cluster: RethinkDBCluster) -> anyhow::Result<()> {
///     reconcile_rethinkdbcluster(ctx, cluster).await?;
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// Returns a [`ReconcileError`] naming the step that failed.
pub async fn reconcile_rethinkdbcluster(
    ctx: &Context,
    cluster: RethinkDBCluster,
) -> Result<(), ReconcileError> {
    let mut cluster = cluster;
    let name = cluster.name_any();
    let namespace = cluster
        .namespace()
        .ok_or_else(|| ReconcileError::MissingNamespace { name: name.clone() })?;

    info!("Reconciling RethinkDBCluster: {}/{}", namespace, name);

    if cluster.spec.set_defaults() {
        debug!(namespace = %namespace, name = %name, spec = ?cluster.spec, "Applied spec defaults");
    }

    let api = ctx.api.as_ref();

    debug!("Step 1: Ensuring cluster Service");
    ensure_cluster_service(api, &cluster, &namespace)
        .await
        .map_err(ReconcileError::ClusterService)?;

    debug!("Step 2: Ensuring driver Service");
    ensure_driver_service(api, &cluster, &namespace)
        .await
        .map_err(ReconcileError::DriverService)?;

    debug!("Step 3: Ensuring StatefulSet");
    ensure_statefulset(api, &cluster, &namespace, cluster.spec.size())
        .await
        .map_err(ReconcileError::StatefulSet)?;

    debug!("Step 4: Refreshing status");
    refresh_status(api, &cluster, &namespace)
        .await
        .map_err(ReconcileError::Status)?;

    debug!(namespace = %namespace, name = %name, "Reconciliation pass complete");
    Ok(())
}

/// Create `desired` unless a `Service` of the same name already exists.
///
/// An existing `Service` is left untouched. A create that loses a race and reports
/// `AlreadyExists` counts as success.
///
/// Returns `true` if this call created the `Service`.
async fn ensure_service(
    api: &dyn ClusterApi,
    namespace: &str,
    desired: &Service,
) -> Result<bool, ApiError> {
    let name = desired.name_any();

    if api.get_service(namespace, &name).await?.is_some() {
        debug!("Service {}/{} already exists, skipping", namespace, name);
        return Ok(false);
    }

    info!("Creating Service {}/{}", namespace, name);
    match api.create_service(namespace, desired).await {
        Ok(()) => {
            record_resource_created(KIND_SERVICE);
            Ok(true)
        }
        Err(e) if e.is_already_exists() => {
            debug!("Service {}/{} was created concurrently", namespace, name);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Ensure the headless `<cluster>-cluster` `Service` exists.
///
/// Returns `true` if this call created it.
///
/// # Errors
///
/// Returns an error if the lookup fails with anything other than not-found, or if
/// the create fails with anything other than already-exists.
pub async fn ensure_cluster_service(
    api: &dyn ClusterApi,
    cluster: &RethinkDBCluster,
    namespace: &str,
) -> Result<bool, ApiError> {
    ensure_service(api, namespace, &build_cluster_service(cluster, namespace)).await
}

/// Ensure the client-facing `<cluster>` `Service` exists.
///
/// Returns `true` if this call created it.
///
/// # Errors
///
/// Same as [`ensure_cluster_service`].
pub async fn ensure_driver_service(
    api: &dyn ClusterApi,
    cluster: &RethinkDBCluster,
    namespace: &str,
) -> Result<bool, ApiError> {
    ensure_service(api, namespace, &build_driver_service(cluster, namespace)).await
}

/// Ensure the `StatefulSet` exists and runs `replicas` pods.
///
/// Only the replica count is reconciled on an existing `StatefulSet`; the pod template
/// is fixed at creation.
///
/// # Errors
///
/// Returns an error if the lookup, create or scale call fails. A create that reports
/// already-exists falls through to the replica check.
pub async fn ensure_statefulset(
    api: &dyn ClusterApi,
    cluster: &RethinkDBCluster,
    namespace: &str,
    replicas: i32,
) -> Result<(), ApiError> {
    let name = cluster.name_any();

    let existing = match api.get_statefulset(namespace, &name).await? {
        Some(sts) => sts,
        None => {
            let mut desired = build_statefulset(cluster, namespace);
            if let Some(spec) = desired.spec.as_mut() {
                spec.replicas = Some(replicas);
            }

            info!(
                "Creating StatefulSet {}/{} with {} replicas",
                namespace, name, replicas
            );
            match api.create_statefulset(namespace, &desired).await {
                Ok(()) => {
                    record_resource_created(KIND_STATEFUL_SET);
                    return Ok(());
                }
                Err(e) if e.is_already_exists() => {
                    debug!("StatefulSet {}/{} was created concurrently", namespace, name);
                    api.get_statefulset(namespace, &name).await?.ok_or_else(|| {
                        ApiError::NotFound {
                            kind: KIND_STATEFUL_SET,
                            namespace: namespace.to_string(),
                            name: name.clone(),
                        }
                    })?
                }
                Err(e) => return Err(e),
            }
        }
    };

    // An unset replica count is defaulted to 1 by the API server.
    let current = existing
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);

    if current == replicas {
        debug!(
            "StatefulSet {}/{} already has {} replicas",
            namespace, name, replicas
        );
        return Ok(());
    }

    info!(
        "Scaling StatefulSet {}/{} from {} to {} replicas",
        namespace, name, current, replicas
    );
    api.scale_statefulset(
        namespace,
        &name,
        existing.metadata.resource_version.as_deref(),
        replicas,
    )
    .await?;
    record_resource_updated(KIND_STATEFUL_SET);

    Ok(())
}

/// Refresh `status.servers` from the pods matching the cluster labels.
///
/// Returns `true` if the status was written.
///
/// # Errors
///
/// Returns an error if listing pods or writing the status fails. A concurrent
/// modification of the resource surfaces as [`ApiError::Conflict`].
pub async fn refresh_status(
    api: &dyn ClusterApi,
    cluster: &RethinkDBCluster,
    namespace: &str,
) -> Result<bool, ApiError> {
    let name = cluster.name_any();
    let selector = build_label_selector(&build_labels(&name));

    let pods = api.list_pods(namespace, &selector).await?;
    let servers = observed_servers(&pods);

    if !servers_changed(cluster.servers(), &servers) {
        debug!(
            namespace = %namespace,
            name = %name,
            servers = ?servers,
            "Status unchanged, skipping update"
        );
        return Ok(false);
    }

    info!(
        "Updating RethinkDBCluster {}/{} status: servers={:?}",
        namespace, name, servers
    );
    api.update_cluster_status(
        namespace,
        &name,
        cluster.metadata.resource_version.as_deref(),
        &build_status(servers),
    )
    .await?;
    record_status_update(KIND_RETHINKDB_CLUSTER);

    Ok(true)
}

#[cfg(test)]
#[path = "rethinkdbcluster_tests.rs"]
mod rethinkdbcluster_tests;
