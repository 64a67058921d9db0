// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation controllers for RethinkDB resources.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `RethinkDBCluster` changes and the objects it owns
//! 2. **Reconcile** - Create whatever is missing and align the replica count
//! 3. **Status** - Report the pods backing the cluster, only when that list changes
//!
//! # Available Reconcilers
//!
//! - [`reconcile_rethinkdbcluster`] - Creates the services and `StatefulSet` of a cluster
//!
//! Deletion needs no reconciler: every object carries an owner reference to its
//! `RethinkDBCluster` and is garbage collected with it.
//!
//! # Example: Dispatching an Event
//!
//! ```rust,no_run
//! use rethinkdb_operator::context::Context;
//! use rethinkdb_operator::crd::RethinkDBCluster;
//! use rethinkdb_operator::reconcilers::Reconcilable;
//! use std::sync::Arc;
//!
//! async fn handle(ctx: &Context, cluster: Arc<RethinkDBCluster>) -> anyhow::Result<()> {
//!     Reconcilable::RethinkDBCluster(cluster).reconcile(ctx).await?;
//!     Ok(())
//! }
//! ```

pub mod rethinkdbcluster;
pub mod status;

#[cfg(test)]
pub(crate) mod fake_api;

pub use rethinkdbcluster::reconcile_rethinkdbcluster;

use crate::api_errors::ReconcileError;
use crate::constants::KIND_RETHINKDB_CLUSTER;
use crate::context::Context;
use crate::crd::RethinkDBCluster;
use kube::ResourceExt;
use std::sync::Arc;

/// A resource the operator knows how to reconcile.
///
/// Every watched kind gets a variant; dispatch is an exhaustive match, so adding a
/// kind without a reconciler does not compile.
#[derive(Clone, Debug)]
pub enum Reconcilable {
    /// A `RethinkDBCluster` custom resource
    RethinkDBCluster(Arc<RethinkDBCluster>),
}

impl Reconcilable {
    /// Kubernetes kind of the wrapped resource, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RethinkDBCluster(_) => KIND_RETHINKDB_CLUSTER,
        }
    }

    /// `namespace/name` of the wrapped resource, for logging.
    #[must_use]
    pub fn object_ref(&self) -> String {
        match self {
            Self::RethinkDBCluster(c) => {
                format!("{}/{}", c.namespace().unwrap_or_default(), c.name_any())
            }
        }
    }

    /// Run one reconcile pass for the wrapped resource.
    ///
    /// # Errors
    ///
    /// Returns the error of the first reconcile step that failed.
    pub async fn reconcile(&self, ctx: &Context) -> Result<(), ReconcileError> {
        match self {
            Self::RethinkDBCluster(cluster) => {
                reconcile_rethinkdbcluster(ctx, cluster.as_ref().clone()).await
            }
        }
    }
}

impl From<Arc<RethinkDBCluster>> for Reconcilable {
    fn from(cluster: Arc<RethinkDBCluster>) -> Self {
        Self::RethinkDBCluster(cluster)
    }
}
