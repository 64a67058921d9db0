// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the RethinkDB operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `RethinkDBCluster` CRD
pub const API_GROUP: &str = "rethinkdb.com";

/// API version for the `RethinkDBCluster` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "rethinkdb.com/v1alpha1";

/// Kind name for `RethinkDBCluster` resource
pub const KIND_RETHINKDB_CLUSTER: &str = "RethinkDBCluster";

/// Kind name for `StatefulSet` resources, used in logs and metrics
pub const KIND_STATEFUL_SET: &str = "StatefulSet";

/// Kind name for `Service` resources, used in logs and metrics
pub const KIND_SERVICE: &str = "Service";

/// Field manager name used for patches issued by the operator
pub const FIELD_MANAGER: &str = "rethinkdb-operator";

// ============================================================================
// RethinkDB Protocol Constants
// ============================================================================

/// HTTP admin console port
pub const HTTP_PORT: i32 = 8080;

/// Client driver port
pub const DRIVER_PORT: i32 = 28015;

/// Intra-cluster gossip port
pub const CLUSTER_PORT: i32 = 29015;

/// Port name for the HTTP admin console
pub const PORT_NAME_HTTP: &str = "http";

/// Port name for the client driver
pub const PORT_NAME_DRIVER: &str = "driver";

/// Port name for intra-cluster traffic
pub const PORT_NAME_CLUSTER: &str = "cluster";

// ============================================================================
// Spec Defaults
// ============================================================================

/// Replica count used when `spec.size` is unset
pub const DEFAULT_CLUSTER_SIZE: i32 = 1;

/// Image repository used when `spec.baseImage` is unset
pub const DEFAULT_BASE_IMAGE: &str = "rethinkdb";

/// Image tag used when `spec.version` is unset
pub const DEFAULT_RETHINKDB_VERSION: &str = "2.3.6";

// ============================================================================
// Pod Template Constants
// ============================================================================

/// Name of the main database container
pub const CONTAINER_NAME_RETHINKDB: &str = "rethinkdb";

/// Name of the init container that seeds the configuration file
pub const CONTAINER_NAME_CLUSTER_INIT: &str = "cluster-init";

/// Image used by the init container (needs `sh` and `nslookup`)
pub const CLUSTER_INIT_IMAGE: &str = "busybox:latest";

/// Path of the database binary inside the image
pub const RETHINKDB_BINARY: &str = "/usr/bin/rethinkdb";

/// Directory holding the generated configuration file
pub const RETHINKDB_CONFIG_DIR: &str = "/etc/rethinkdb";

/// Generated configuration file
pub const RETHINKDB_CONFIG_FILE: &str = "/etc/rethinkdb/rethinkdb.conf";

/// Data directory of the database process
pub const RETHINKDB_DATA_DIR: &str = "/var/lib/rethinkdb/default";

/// Volume holding the data directory
pub const VOLUME_DATA: &str = "rethinkdb-data";

/// Volume holding the generated configuration
pub const VOLUME_CONFIG: &str = "rethinkdb-etc";

/// Grace period given to pods on termination
pub const TERMINATION_GRACE_PERIOD_SECS: i64 = 5;

/// Suffix appended to the cluster name for the headless gossip service
pub const CLUSTER_SERVICE_SUFFIX: &str = "-cluster";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Requeue duration after a successful reconciliation (5 minutes)
pub const RESYNC_REQUEUE_DURATION_SECS: u64 = 300;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Environment variable holding the namespace to watch
pub const NAMESPACE_ENV_VAR: &str = "MY_POD_NAMESPACE";

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint served next to metrics
pub const HEALTH_SERVER_PATH: &str = "/healthz";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
