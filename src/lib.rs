// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # RethinkDB Operator for Kubernetes
//!
//! A Kubernetes operator that runs RethinkDB clusters described by a
//! `RethinkDBCluster` custom resource.
//!
//! ## Overview
//!
//! For every `RethinkDBCluster` named `<name>` the operator maintains:
//!
//! - a headless `Service` `<name>-cluster` for server-to-server traffic
//! - a `NodePort` `Service` `<name>` exposing the admin console and driver port
//! - a `StatefulSet` `<name>` running `spec.size` RethinkDB servers
//! - `status.servers`, the names of the pods currently backing the cluster
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation logic
//! - [`rethinkdb_resources`] - Builders for the owned Kubernetes objects
//! - [`cluster_api`] - The Kubernetes calls a reconcile pass makes
//! - [`context`] - Shared controller context
//! - [`config`] - Process configuration
//! - [`health`] - Probe and metrics HTTP endpoints
//!
//! ## Example
//!
//! ```rust
//! use rethinkdb_operator::crd::RethinkDBClusterSpec;
//!
//! let mut spec = RethinkDBClusterSpec {
//!     size: Some(3),
//!     ..Default::default()
//! };
//! spec.set_defaults();
//!
//! assert_eq!(spec.size(), 3);
//! assert_eq!(spec.image(), "rethinkdb:2.3.6");
//! ```

pub mod api_errors;
pub mod cluster_api;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod health;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod rethinkdb_resources;
