// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the controller.
//!
//! The controller receives an `Arc<Context>` that carries every dependency a
//! reconcile pass needs. Nothing is read from process-wide state during
//! reconciliation: the API handle and the watched namespace are supplied once at
//! startup.

use crate::cluster_api::{ClusterApi, KubeClusterApi};
use kube::Client;
use std::sync::Arc;

/// Shared context passed to the `RethinkDBCluster` controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes API used by reconcile passes
    pub api: Arc<dyn ClusterApi>,

    /// Namespace the operator watches, or `None` for all namespaces
    pub watch_namespace: Option<String>,
}

impl Context {
    /// Build a context around an arbitrary [`ClusterApi`].
    #[must_use]
    pub fn new(api: Arc<dyn ClusterApi>, watch_namespace: Option<String>) -> Self {
        Self {
            api,
            watch_namespace,
        }
    }

    /// Build a context that talks to the API server through `client`.
    #[must_use]
    pub fn from_client(client: Client, watch_namespace: Option<String>) -> Self {
        Self::new(Arc::new(KubeClusterApi::new(client)), watch_namespace)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("watch_namespace", &self.watch_namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
