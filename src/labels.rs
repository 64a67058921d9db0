// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants used for every object the operator creates.
//!
//! The selector labels (`app`, `cluster`) are the contract between the
//! StatefulSet, both Services and the pod listing in the status refresh.
//! Changing them orphans existing clusters.

// ============================================================================
// Selector Labels
// ============================================================================

/// Label naming the application
pub const APP_LABEL: &str = "app";

/// Label naming the owning `RethinkDBCluster`
pub const CLUSTER_LABEL: &str = "cluster";

/// Value of the `app` label
pub const APP_NAME_RETHINKDB: &str = "rethinkdb";
