// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes API and reconciliation error types.
//!
//! This module provides:
//! - [`ApiError`] - classification of a failed orchestration API call
//! - [`ReconcileError`] - a failed reconcile step, carrying the step that failed
//!
//! Only three outcomes of an API call matter to the reconciler: the object was
//! missing (take the create branch), the object already existed (treat the create
//! as done), or anything else (abort the pass and let the controller requeue).

use thiserror::Error;

/// Errors returned by the Kubernetes API layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested object does not exist (HTTP 404).
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Kind of the missing object
        kind: &'static str,
        /// Namespace that was queried
        namespace: String,
        /// Name that was queried
        name: String,
    },

    /// An object with the same name already exists (HTTP 409, reason `AlreadyExists`).
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        /// Kind of the existing object
        kind: &'static str,
        /// Namespace of the existing object
        namespace: String,
        /// Name of the existing object
        name: String,
    },

    /// The write was based on a stale `resourceVersion` (HTTP 409, reason `Conflict`).
    #[error("{kind} {namespace}/{name} was modified concurrently: {message}")]
    Conflict {
        /// Kind of the object being written
        kind: &'static str,
        /// Namespace of the object
        namespace: String,
        /// Name of the object
        name: String,
        /// Message from the API server
        message: String,
    },

    /// The API server rejected the request for any other reason.
    #[error("{kind} {namespace}/{name}: API server returned {code} {reason}: {message}")]
    Rejected {
        /// Kind of the object the request targeted
        kind: &'static str,
        /// Namespace of the object
        namespace: String,
        /// Name of the object
        name: String,
        /// HTTP status code
        code: u16,
        /// Machine-readable reason (e.g. `Forbidden`)
        reason: String,
        /// Message from the API server
        message: String,
    },

    /// The request never produced an API response (network, TLS, serialization).
    #[error("request for {kind} {namespace}/{name} failed: {source}")]
    Transport {
        /// Kind of the object the request targeted
        kind: &'static str,
        /// Namespace of the object
        namespace: String,
        /// Name of the object
        name: String,
        /// Underlying client error
        #[source]
        source: kube::Error,
    },
}

impl ApiError {
    /// Classify a `kube::Error` returned while operating on `kind` `namespace/name`.
    #[must_use]
    pub fn from_kube(kind: &'static str, namespace: &str, name: &str, err: kube::Error) -> Self {
        let namespace = namespace.to_string();
        let name = name.to_string();

        match err {
            kube::Error::Api(ae) => {
                Self::from_status(kind, namespace, name, ae.code, &ae.reason, &ae.message)
            }
            source => Self::Transport {
                kind,
                namespace,
                name,
                source,
            },
        }
    }

    /// Classify an API server status response by HTTP code and reason.
    #[must_use]
    pub fn from_status(
        kind: &'static str,
        namespace: String,
        name: String,
        code: u16,
        reason: &str,
        message: &str,
    ) -> Self {
        match (code, reason) {
            (404, _) => Self::NotFound {
                kind,
                namespace,
                name,
            },
            (409, "AlreadyExists") => Self::AlreadyExists {
                kind,
                namespace,
                name,
            },
            (409, _) => Self::Conflict {
                kind,
                namespace,
                name,
                message: message.to_string(),
            },
            (code, reason) => Self::Rejected {
                kind,
                namespace,
                name,
                code,
                reason: reason.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error means a create lost a race to an identical name.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Short label for metrics.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Conflict { .. } => "conflict",
            Self::Rejected { .. } => "api_error",
            Self::Transport { .. } => "network_error",
        }
    }
}

/// A reconcile pass that stopped at a specific step.
///
/// Earlier steps have already taken effect; later steps did not run.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The resource carried no namespace.
    #[error("RethinkDBCluster {name} has no namespace")]
    MissingNamespace {
        /// Name of the resource
        name: String,
    },

    /// Ensuring the headless gossip `Service` failed.
    #[error("failed to create or update cluster service: {0}")]
    ClusterService(#[source] ApiError),

    /// Ensuring the client-facing driver `Service` failed.
    #[error("failed to create or update driver service: {0}")]
    DriverService(#[source] ApiError),

    /// Ensuring or scaling the `StatefulSet` failed.
    #[error("failed to create or update statefulset: {0}")]
    StatefulSet(#[source] ApiError),

    /// Listing pods or writing status failed.
    #[error("failed to update rethinkdb status: {0}")]
    Status(#[source] ApiError),
}

impl ReconcileError {
    /// Underlying API error, if the failure came from an API call.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::MissingNamespace { .. } => None,
            Self::ClusterService(e)
            | Self::DriverService(e)
            | Self::StatefulSet(e)
            | Self::Status(e) => Some(e),
        }
    }

    /// Short label for metrics.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        self.api_error()
            .map_or("validation_error", ApiError::error_type)
    }
}

#[cfg(test)]
#[path = "api_errors_tests.rs"]
mod api_errors_tests;
