// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ClusterApi`] used by reconciler tests.
//!
//! Stores objects by `(namespace, name)`, records every write in order, and can be
//! told to fail a given call or to lose every create to a concurrent writer.

use crate::api_errors::ApiError;
use crate::cluster_api::ClusterApi;
use crate::constants::{KIND_RETHINKDB_CLUSTER, KIND_SERVICE, KIND_STATEFUL_SET};
use crate::crd::{RethinkDBCluster, RethinkDBClusterStatus};
use k8s_openapi::api::{
    apps::v1::StatefulSet,
    core::v1::{Pod, Service},
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// Calls that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    GetService,
    CreateService,
    GetStatefulSet,
    CreateStatefulSet,
    ScaleStatefulSet,
    ListPods,
    UpdateStatus,
}

/// A mutating call that reached the fake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    CreateService(String),
    CreateStatefulSet { name: String, replicas: Option<i32> },
    ScaleStatefulSet { name: String, replicas: i32 },
    UpdateStatus { name: String, servers: Vec<String> },
}

#[derive(Default)]
struct State {
    services: BTreeMap<Key, Service>,
    statefulsets: BTreeMap<Key, StatefulSet>,
    pods: Vec<Pod>,
    statuses: BTreeMap<Key, RethinkDBClusterStatus>,
    cluster_versions: BTreeMap<Key, String>,
    writes: Vec<Write>,
    failures: HashMap<Op, (u16, String)>,
    lose_create_races: bool,
    next_version: u64,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn injected(&self, op: Op, kind: &'static str, namespace: &str, name: &str) -> Result<(), ApiError> {
        match self.failures.get(&op) {
            Some((code, reason)) => Err(ApiError::from_status(
                kind,
                namespace.to_string(),
                name.to_string(),
                *code,
                reason,
                "injected failure",
            )),
            None => Ok(()),
        }
    }
}

fn already_exists(kind: &'static str, namespace: &str, name: &str) -> ApiError {
    ApiError::AlreadyExists {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

fn conflict(kind: &'static str, namespace: &str, name: &str) -> ApiError {
    ApiError::Conflict {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
        message: "the object has been modified".to_string(),
    }
}

fn matches_selector(pod: &Pod, selector: &str) -> bool {
    let labels = pod.labels();
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels.get(k).is_some_and(|lv| lv == v),
            None => false,
        })
}

/// In-memory cluster.
#[derive(Default)]
pub struct FakeClusterApi {
    state: Mutex<State>,
}

impl FakeClusterApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` call fail with the given HTTP code and reason.
    pub fn fail(&self, op: Op, code: u16, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, (code, reason.to_string()));
    }

    /// Let `op` succeed again.
    pub fn heal(&self, op: Op) {
        self.state.lock().unwrap().failures.remove(&op);
    }

    /// Every create stores the object and then reports `AlreadyExists`, as if another
    /// writer got there first.
    pub fn lose_create_races(&self) {
        self.state.lock().unwrap().lose_create_races = true;
    }

    /// Add a pod carrying the given labels.
    pub fn add_pod(&self, namespace: &str, name: &str, labels: BTreeMap<String, String>) {
        self.state.lock().unwrap().pods.push(Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        });
    }

    /// Drop every pod whose name is in `names`.
    pub fn remove_pods(&self, names: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .pods
            .retain(|p| !names.contains(&p.name_any().as_str()));
    }

    /// Seed an existing `StatefulSet`.
    pub fn insert_statefulset(&self, namespace: &str, statefulset: StatefulSet) {
        let mut state = self.state.lock().unwrap();
        let mut sts = statefulset;
        sts.metadata.resource_version = Some(state.bump_version());
        state.statefulsets.insert(key(namespace, &sts.name_any()), sts);
    }

    /// Pretend the stored `RethinkDBCluster` is now at `resource_version`.
    pub fn set_cluster_version(&self, namespace: &str, name: &str, resource_version: &str) {
        self.state
            .lock()
            .unwrap()
            .cluster_versions
            .insert(key(namespace, name), resource_version.to_string());
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .services
            .keys()
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn statefulset(&self, namespace: &str, name: &str) -> Option<StatefulSet> {
        self.state
            .lock()
            .unwrap()
            .statefulsets
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn status(&self, namespace: &str, name: &str) -> Option<RethinkDBClusterStatus> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .get(&key(namespace, name))
            .cloned()
    }

    /// `cluster` as the next watch event would deliver it, carrying the stored status
    /// and resource version.
    pub fn refreshed(&self, cluster: &RethinkDBCluster) -> RethinkDBCluster {
        let namespace = cluster.namespace().unwrap_or_default();
        let name = cluster.name_any();
        let state = self.state.lock().unwrap();
        let mut next = cluster.clone();
        next.status = state.statuses.get(&key(&namespace, &name)).cloned();
        if let Some(rv) = state.cluster_versions.get(&key(&namespace, &name)) {
            next.metadata.resource_version = Some(rv.clone());
        }
        next
    }
}

#[async_trait::async_trait]
impl ClusterApi for FakeClusterApi {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>, ApiError> {
        let state = self.state.lock().unwrap();
        state.injected(Op::GetService, KIND_SERVICE, namespace, name)?;
        Ok(state.services.get(&key(namespace, name)).cloned())
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> Result<(), ApiError> {
        let name = service.name_any();
        let mut state = self.state.lock().unwrap();
        state.injected(Op::CreateService, KIND_SERVICE, namespace, &name)?;

        let k = key(namespace, &name);
        if state.services.contains_key(&k) {
            return Err(already_exists(KIND_SERVICE, namespace, &name));
        }
        state.services.insert(k, service.clone());
        if state.lose_create_races {
            return Err(already_exists(KIND_SERVICE, namespace, &name));
        }
        state.writes.push(Write::CreateService(name));
        Ok(())
    }

    async fn get_statefulset(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StatefulSet>, ApiError> {
        let state = self.state.lock().unwrap();
        state.injected(Op::GetStatefulSet, KIND_STATEFUL_SET, namespace, name)?;
        Ok(state.statefulsets.get(&key(namespace, name)).cloned())
    }

    async fn create_statefulset(
        &self,
        namespace: &str,
        statefulset: &StatefulSet,
    ) -> Result<(), ApiError> {
        let name = statefulset.name_any();
        let mut state = self.state.lock().unwrap();
        state.injected(Op::CreateStatefulSet, KIND_STATEFUL_SET, namespace, &name)?;

        let k = key(namespace, &name);
        if state.statefulsets.contains_key(&k) {
            return Err(already_exists(KIND_STATEFUL_SET, namespace, &name));
        }
        let mut stored = statefulset.clone();
        stored.metadata.resource_version = Some(state.bump_version());
        state.statefulsets.insert(k, stored);
        if state.lose_create_races {
            return Err(already_exists(KIND_STATEFUL_SET, namespace, &name));
        }
        state.writes.push(Write::CreateStatefulSet {
            name,
            replicas: statefulset.spec.as_ref().and_then(|s| s.replicas),
        });
        Ok(())
    }

    async fn scale_statefulset(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        replicas: i32,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.injected(Op::ScaleStatefulSet, KIND_STATEFUL_SET, namespace, name)?;

        let next_version = state.bump_version();
        let Some(sts) = state.statefulsets.get_mut(&key(namespace, name)) else {
            return Err(ApiError::NotFound {
                kind: KIND_STATEFUL_SET,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };
        if resource_version.is_some() && sts.metadata.resource_version.as_deref() != resource_version {
            return Err(conflict(KIND_STATEFUL_SET, namespace, name));
        }
        sts.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
        sts.metadata.resource_version = Some(next_version);
        state.writes.push(Write::ScaleStatefulSet {
            name: name.to_string(),
            replicas,
        });
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ApiError> {
        let state = self.state.lock().unwrap();
        state.injected(Op::ListPods, "Pod", namespace, label_selector)?;
        Ok(state
            .pods
            .iter()
            .filter(|p| p.namespace().as_deref() == Some(namespace))
            .filter(|p| matches_selector(p, label_selector))
            .cloned()
            .collect())
    }

    async fn update_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &RethinkDBClusterStatus,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.injected(Op::UpdateStatus, KIND_RETHINKDB_CLUSTER, namespace, name)?;

        let k = key(namespace, name);
        if let (Some(sent), Some(stored)) = (resource_version, state.cluster_versions.get(&k)) {
            if sent != stored {
                return Err(conflict(KIND_RETHINKDB_CLUSTER, namespace, name));
            }
        }
        let next_version = state.bump_version();
        state.cluster_versions.insert(k.clone(), next_version);
        state.statuses.insert(k, status.clone());
        state.writes.push(Write::UpdateStatus {
            name: name.to_string(),
            servers: status.servers.clone(),
        });
        Ok(())
    }
}
