// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for RethinkDB cluster management.
//!
//! # Resource Types
//!
//! - [`RethinkDBCluster`] - Desired state of a RethinkDB cluster: size, image and pod policy
//!
//! # Example: Declaring a Cluster
//!
//! ```rust,no_run
//! use rethinkdb_operator::crd::{PodPolicy, RethinkDBClusterSpec};
//!
//! let spec = RethinkDBClusterSpec {
//!     size: Some(3),
//!     base_image: Some("rethinkdb".to_string()),
//!     version: Some("2.3.6".to_string()),
//!     pod: Some(PodPolicy::default()),
//! };
//! ```

use crate::constants::{DEFAULT_BASE_IMAGE, DEFAULT_CLUSTER_SIZE, DEFAULT_RETHINKDB_VERSION};
use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, ResourceRequirements};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pod-level policy applied to every RethinkDB server in the cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodPolicy {
    /// Compute resources for the `rethinkdb` container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Claim template for the data directory.
    ///
    /// When set, each server gets a `PersistentVolumeClaim` built from this spec.
    /// When absent, data lives in an `emptyDir` and is lost with the pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim_spec: Option<PersistentVolumeClaimSpec>,
}

/// `RethinkDBCluster` declares a RethinkDB cluster running as a `StatefulSet`.
///
/// Every field is optional; unset fields are filled by [`RethinkDBClusterSpec::set_defaults`]
/// before any Kubernetes object is built.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "rethinkdb.com",
    version = "v1alpha1",
    kind = "RethinkDBCluster",
    namespaced,
    shortname = "rdb",
    doc = "RethinkDBCluster runs a RethinkDB cluster as a StatefulSet with a headless gossip Service and a client-facing driver Service.",
    printcolumn = r#"{"name":"Size","type":"integer","jsonPath":".spec.size"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Servers","type":"string","jsonPath":".status.servers"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "RethinkDBClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct RethinkDBClusterSpec {
    /// Number of RethinkDB servers. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0))]
    pub size: Option<i32>,

    /// Image repository, without tag. Defaults to `rethinkdb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,

    /// Image tag. Defaults to `2.3.6`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Pod policy (resources and storage).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodPolicy>,
}

/// `RethinkDBCluster` status
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RethinkDBClusterStatus {
    /// Names of the pods currently backing the cluster, in API listing order.
    #[serde(default)]
    pub servers: Vec<String>,
}

impl RethinkDBClusterSpec {
    /// Fill every unset field with its default.
    ///
    /// Returns `true` if any field was changed.
    pub fn set_defaults(&mut self) -> bool {
        let mut changed = false;

        if self.size.is_none() {
            self.size = Some(DEFAULT_CLUSTER_SIZE);
            changed = true;
        }
        if self.base_image.as_deref().is_none_or(str::is_empty) {
            self.base_image = Some(DEFAULT_BASE_IMAGE.to_string());
            changed = true;
        }
        if self.version.as_deref().is_none_or(str::is_empty) {
            self.version = Some(DEFAULT_RETHINKDB_VERSION.to_string());
            changed = true;
        }
        if self.pod.is_none() {
            self.pod = Some(PodPolicy::default());
            changed = true;
        }

        changed
    }

    /// Desired replica count.
    #[must_use]
    pub fn size(&self) -> i32 {
        self.size.unwrap_or(DEFAULT_CLUSTER_SIZE)
    }

    /// Full container image reference, `<baseImage>:<version>`.
    #[must_use]
    pub fn image(&self) -> String {
        let base = self
            .base_image
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_IMAGE);
        let version = self
            .version
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_RETHINKDB_VERSION);
        format!("{base}:{version}")
    }

    /// Whether the data directory is backed by a `PersistentVolumeClaim`.
    #[must_use]
    pub fn is_pv_enabled(&self) -> bool {
        self.persistent_volume_claim_spec().is_some()
    }

    /// Claim spec for the data volume, if persistence is enabled.
    #[must_use]
    pub fn persistent_volume_claim_spec(&self) -> Option<&PersistentVolumeClaimSpec> {
        self.pod
            .as_ref()
            .and_then(|p| p.persistent_volume_claim_spec.as_ref())
    }

    /// Resource requirements for the database container.
    #[must_use]
    pub fn resources(&self) -> Option<&ResourceRequirements> {
        self.pod.as_ref().and_then(|p| p.resources.as_ref())
    }
}

impl RethinkDBCluster {
    /// Pod names currently recorded in status.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        self.status.as_ref().map_or(&[], |s| s.servers.as_slice())
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
