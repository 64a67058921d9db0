// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status helpers for `RethinkDBCluster` resources.
//!
//! The status reports the pods that currently back a cluster. It is rewritten only
//! when the observed pod list differs from the stored one, using exact structural
//! equality: same length, same order, same names.
//!
//! Pod names are kept in the order the API server lists them. The API does not
//! promise a stable order, so a pure reordering of an unchanged pod set shows up
//! as a status write.

use crate::crd::RethinkDBClusterStatus;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// Collect pod names in listing order.
#[must_use]
pub fn observed_servers(pods: &[Pod]) -> Vec<String> {
    pods.iter().map(ResourceExt::name_any).collect()
}

/// Check whether the stored server list differs from the observed one.
///
/// # Example
///
/// ```rust
/// # use rethinkdb_operator::reconcilers::status::servers_changed;
/// let stored = vec!["db-0".to_string(), "db-1".to_string()];
/// assert!(!servers_changed(&stored, &stored.clone()));
/// assert!(servers_changed(&stored, &["db-1".to_string(), "db-0".to_string()]));
/// ```
#[must_use]
pub fn servers_changed(stored: &[String], observed: &[String]) -> bool {
    stored != observed
}

/// Build the status to write for an observed server list.
#[must_use]
pub fn build_status(servers: Vec<String>) -> RethinkDBClusterStatus {
    RethinkDBClusterStatus { servers }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
