// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes API access used by the reconciler.
//!
//! The reconciler only needs a handful of calls: get/create for `Services` and
//! `StatefulSets`, a replica-count update, a pod listing and a status write. They are
//! grouped behind the [`ClusterApi`] trait so that reconciliation can run against the
//! real API server ([`KubeClusterApi`]) or an in-memory cluster in tests.
//!
//! Every method reports failures as [`ApiError`], already classified into
//! not-found / already-exists / conflict / other.

use crate::api_errors::ApiError;
use crate::constants::{FIELD_MANAGER, KIND_RETHINKDB_CLUSTER, KIND_SERVICE, KIND_STATEFUL_SET};
use crate::crd::{RethinkDBCluster, RethinkDBClusterStatus};
use k8s_openapi::api::{
    apps::v1::StatefulSet,
    core::v1::{Pod, Service},
};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// The subset of the Kubernetes API a reconcile pass uses.
#[async_trait::async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch a `Service`. Returns `Ok(None)` if it does not exist.
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>, ApiError>;

    /// Create a `Service`. Returns [`ApiError::AlreadyExists`] if the name is taken.
    async fn create_service(&self, namespace: &str, service: &Service) -> Result<(), ApiError>;

    /// Fetch a `StatefulSet`. Returns `Ok(None)` if it does not exist.
    async fn get_statefulset(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StatefulSet>, ApiError>;

    /// Create a `StatefulSet`. Returns [`ApiError::AlreadyExists`] if the name is taken.
    async fn create_statefulset(
        &self,
        namespace: &str,
        statefulset: &StatefulSet,
    ) -> Result<(), ApiError>;

    /// Set `spec.replicas` on an existing `StatefulSet`, leaving every other field alone.
    ///
    /// When `resource_version` is given the write is rejected with
    /// [`ApiError::Conflict`] if the object changed since it was read.
    async fn scale_statefulset(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        replicas: i32,
    ) -> Result<(), ApiError>;

    /// List pods in `namespace` matching an equality-based label selector,
    /// in the order the API server returns them.
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ApiError>;

    /// Write the status subresource of a `RethinkDBCluster`.
    ///
    /// When `resource_version` is given the write is rejected with
    /// [`ApiError::Conflict`] if the object changed since it was read.
    async fn update_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &RethinkDBClusterStatus,
    ) -> Result<(), ApiError>;
}

/// [`ClusterApi`] backed by a live Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    /// Wrap a Kubernetes client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

fn patch_params() -> PatchParams {
    PatchParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

/// Builds a merge patch, optionally pinned to a `resourceVersion`.
fn versioned_merge_patch(
    resource_version: Option<&str>,
    body: serde_json::Value,
) -> serde_json::Value {
    let mut patch = body;
    if let Some(rv) = resource_version {
        patch["metadata"] = json!({ "resourceVersion": rv });
    }
    patch
}

#[async_trait::async_trait]
impl ClusterApi for KubeClusterApi {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>, ApiError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(svc) => Ok(Some(svc)),
            Err(e) => match ApiError::from_kube(KIND_SERVICE, namespace, name, e) {
                err if err.is_not_found() => Ok(None),
                err => Err(err),
            },
        }
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> Result<(), ApiError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.create(&post_params(), service)
            .await
            .map_err(|e| ApiError::from_kube(KIND_SERVICE, namespace, &service.name_any(), e))?;
        Ok(())
    }

    async fn get_statefulset(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StatefulSet>, ApiError> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(sts) => Ok(Some(sts)),
            Err(e) => match ApiError::from_kube(KIND_STATEFUL_SET, namespace, name, e) {
                err if err.is_not_found() => Ok(None),
                err => Err(err),
            },
        }
    }

    async fn create_statefulset(
        &self,
        namespace: &str,
        statefulset: &StatefulSet,
    ) -> Result<(), ApiError> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.create(&post_params(), statefulset)
            .await
            .map_err(|e| {
                ApiError::from_kube(KIND_STATEFUL_SET, namespace, &statefulset.name_any(), e)
            })?;
        Ok(())
    }

    async fn scale_statefulset(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        replicas: i32,
    ) -> Result<(), ApiError> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let patch = versioned_merge_patch(
            resource_version,
            json!({ "spec": { "replicas": replicas } }),
        );

        debug!(namespace = %namespace, name = %name, replicas, "Patching StatefulSet replicas");

        api.patch(name, &patch_params(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ApiError::from_kube(KIND_STATEFUL_SET, namespace, name, e))?;
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ApiError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| ApiError::from_kube("Pod", namespace, label_selector, e))?;
        Ok(list.items)
    }

    async fn update_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &RethinkDBClusterStatus,
    ) -> Result<(), ApiError> {
        let api: Api<RethinkDBCluster> = Api::namespaced(self.client.clone(), namespace);
        let patch = versioned_merge_patch(resource_version, json!({ "status": status }));

        debug!(namespace = %namespace, name = %name, servers = ?status.servers, "Patching RethinkDBCluster status");

        api.patch_status(name, &patch_params(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ApiError::from_kube(KIND_RETHINKDB_CLUSTER, namespace, name, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cluster_api_tests.rs"]
mod cluster_api_tests;
