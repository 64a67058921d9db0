// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RethinkDB Kubernetes resource builders
//!
//! This module provides functions to build the Kubernetes resources (`StatefulSet`, `Service`)
//! that back a `RethinkDBCluster`. All functions are pure and easily testable: every object is
//! fully determined by the cluster's spec, name, namespace and uid.

use crate::constants::{
    API_GROUP_VERSION, CLUSTER_INIT_IMAGE, CLUSTER_PORT, CLUSTER_SERVICE_SUFFIX,
    CONTAINER_NAME_CLUSTER_INIT, CONTAINER_NAME_RETHINKDB, DRIVER_PORT, HTTP_PORT,
    KIND_RETHINKDB_CLUSTER, PORT_NAME_CLUSTER, PORT_NAME_DRIVER, PORT_NAME_HTTP,
    RETHINKDB_BINARY, RETHINKDB_CONFIG_DIR, RETHINKDB_CONFIG_FILE, RETHINKDB_DATA_DIR,
    TERMINATION_GRACE_PERIOD_SECS, VOLUME_CONFIG, VOLUME_DATA,
};
use crate::crd::RethinkDBCluster;
use crate::labels::{APP_LABEL, APP_NAME_RETHINKDB, CLUSTER_LABEL};
use k8s_openapi::api::{
    apps::v1::{StatefulSet, StatefulSetSpec},
    core::v1::{
        Container, ContainerPort, EmptyDirVolumeSource, PersistentVolumeClaim, PodSpec,
        PodTemplateSpec, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
    },
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// Builds the label set shared by every object belonging to a cluster.
///
/// These labels double as the pod selector of both Services and the `StatefulSet`,
/// and as the label selector used when listing pods for status.
#[must_use]
pub fn build_labels(cluster_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(APP_LABEL.into(), APP_NAME_RETHINKDB.into());
    labels.insert(CLUSTER_LABEL.into(), cluster_name.into());
    labels
}

/// Renders a label map as a Kubernetes equality-based label selector
/// (`key1=value1,key2=value2`).
#[must_use]
pub fn build_label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Name of the headless gossip `Service`, `<cluster>-cluster`.
#[must_use]
pub fn cluster_service_name(cluster_name: &str) -> String {
    format!("{cluster_name}{CLUSTER_SERVICE_SUFFIX}")
}

/// Builds owner references for a resource owned by a `RethinkDBCluster`
///
/// Sets up cascade deletion so that when the `RethinkDBCluster` is deleted,
/// its `StatefulSet` and `Services` are removed by the garbage collector.
#[must_use]
pub fn build_owner_references(cluster: &RethinkDBCluster) -> Vec<OwnerReference> {
    vec![OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_RETHINKDB_CLUSTER.to_string(),
        name: cluster.name_any(),
        uid: cluster.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }]
}

fn build_metadata(name: String, namespace: &str, cluster: &RethinkDBCluster) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace.into()),
        labels: Some(build_labels(&cluster.name_any())),
        owner_references: Some(build_owner_references(cluster)),
        ..Default::default()
    }
}

fn service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.into()),
        port,
        protocol: Some("TCP".into()),
        ..Default::default()
    }
}

/// Builds the headless `Service` used for server-to-server traffic.
///
/// The `Service` has no cluster IP, so each pod gets a stable DNS name
/// (`<cluster>-<ordinal>.<cluster>-cluster`), and exposes only the gossip port.
#[must_use]
pub fn build_cluster_service(cluster: &RethinkDBCluster, namespace: &str) -> Service {
    let name = cluster_service_name(&cluster.name_any());
    debug!(name = %name, namespace = %namespace, "Building cluster Service");

    Service {
        metadata: build_metadata(name, namespace, cluster),
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".into()),
            selector: Some(build_labels(&cluster.name_any())),
            ports: Some(vec![service_port(PORT_NAME_CLUSTER, CLUSTER_PORT)]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the client-facing `Service` exposing the admin console and the driver port.
///
/// Uses `NodePort` so the admin console is reachable from outside the cluster, and
/// `ClientIP` session affinity so a client keeps talking to the same server.
#[must_use]
pub fn build_driver_service(cluster: &RethinkDBCluster, namespace: &str) -> Service {
    let name = cluster.name_any();
    debug!(name = %name, namespace = %namespace, "Building driver Service");

    Service {
        metadata: build_metadata(name.clone(), namespace, cluster),
        spec: Some(ServiceSpec {
            type_: Some("NodePort".into()),
            session_affinity: Some("ClientIP".into()),
            selector: Some(build_labels(&name)),
            ports: Some(vec![
                service_port(PORT_NAME_HTTP, HTTP_PORT),
                service_port(PORT_NAME_DRIVER, DRIVER_PORT),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the `StatefulSet` running one RethinkDB server per replica.
///
/// The replica count comes from `spec.size`; callers are expected to have applied
/// defaults first. Persistent storage is used iff the pod policy carries a claim spec.
#[must_use]
pub fn build_statefulset(cluster: &RethinkDBCluster, namespace: &str) -> StatefulSet {
    let name = cluster.name_any();
    let labels = build_labels(&name);
    let spec = &cluster.spec;

    debug!(
        name = %name,
        namespace = %namespace,
        replicas = spec.size(),
        persistent = spec.is_pv_enabled(),
        "Building StatefulSet"
    );

    StatefulSet {
        metadata: build_metadata(name.clone(), namespace, cluster),
        spec: Some(StatefulSetSpec {
            replicas: Some(spec.size()),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            service_name: cluster_service_name(&name).into(),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    init_containers: Some(vec![build_init_container(&name)]),
                    containers: vec![build_rethinkdb_container(cluster)],
                    termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECS),
                    volumes: Some(build_volumes(cluster)),
                    ..Default::default()
                }),
            },
            volume_claim_templates: build_volume_claim_templates(cluster),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Baseline `rethinkdb.conf` written by the init container.
#[must_use]
pub fn build_default_config() -> String {
    format!("bind=all\ndirectory={RETHINKDB_DATA_DIR}\n")
}

/// Shell script run by the init container.
///
/// Writes the baseline configuration, then appends a `join=` directive pointing at
/// ordinal 0 if the headless `Service` already resolves. This is a best-effort
/// bootstrap: the first server of a fresh cluster finds nothing and starts alone.
#[must_use]
pub fn build_init_script(cluster_name: &str) -> String {
    let service = cluster_service_name(cluster_name);
    let config = build_default_config();
    format!(
        "echo '{config}' > {RETHINKDB_CONFIG_FILE}; \
         if nslookup {service}; then \
         echo join={cluster_name}-0.{service}:{CLUSTER_PORT} >> {RETHINKDB_CONFIG_FILE}; \
         fi;"
    )
}

fn build_init_container(cluster_name: &str) -> Container {
    Container {
        name: CONTAINER_NAME_CLUSTER_INIT.into(),
        image: Some(CLUSTER_INIT_IMAGE.into()),
        command: Some(vec![
            "/bin/sh".into(),
            "-c".into(),
            build_init_script(cluster_name),
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: VOLUME_CONFIG.into(),
            mount_path: RETHINKDB_CONFIG_DIR.into(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.into()),
        container_port: port,
        protocol: Some("TCP".into()),
        ..Default::default()
    }
}

fn build_rethinkdb_container(cluster: &RethinkDBCluster) -> Container {
    Container {
        name: CONTAINER_NAME_RETHINKDB.into(),
        image: Some(cluster.spec.image()),
        command: Some(vec![
            RETHINKDB_BINARY.into(),
            "--no-update-check".into(),
            "--config-file".into(),
            RETHINKDB_CONFIG_FILE.into(),
        ]),
        ports: Some(vec![
            container_port(PORT_NAME_HTTP, HTTP_PORT),
            container_port(PORT_NAME_DRIVER, DRIVER_PORT),
            container_port(PORT_NAME_CLUSTER, CLUSTER_PORT),
        ]),
        resources: cluster.spec.resources().cloned(),
        // Allows `kubectl attach -it` to the server console.
        stdin: Some(true),
        tty: Some(true),
        volume_mounts: Some(vec![
            VolumeMount {
                name: VOLUME_DATA.into(),
                mount_path: RETHINKDB_DATA_DIR.into(),
                ..Default::default()
            },
            VolumeMount {
                name: VOLUME_CONFIG.into(),
                mount_path: RETHINKDB_CONFIG_DIR.into(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

fn empty_dir_volume(name: &str) -> Volume {
    Volume {
        name: name.into(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

/// Pod volumes. The data volume is only declared here when it is not claim-backed;
/// otherwise the claim template of the same name provides it.
fn build_volumes(cluster: &RethinkDBCluster) -> Vec<Volume> {
    let mut volumes = vec![empty_dir_volume(VOLUME_CONFIG)];
    if !cluster.spec.is_pv_enabled() {
        volumes.push(empty_dir_volume(VOLUME_DATA));
    }
    volumes
}

fn build_volume_claim_templates(cluster: &RethinkDBCluster) -> Option<Vec<PersistentVolumeClaim>> {
    cluster.spec.persistent_volume_claim_spec().map(|claim| {
        vec![PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(VOLUME_DATA.into()),
                labels: Some(build_labels(&cluster.name_any())),
                ..Default::default()
            },
            spec: Some(claim.clone()),
            ..Default::default()
        }]
    })
}

#[cfg(test)]
#[path = "rethinkdb_resources_tests.rs"]
mod rethinkdb_resources_tests;
