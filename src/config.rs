// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator process configuration.
//!
//! Every setting can come from a command-line flag or an environment variable, so the
//! same binary runs unchanged from a terminal or a `Deployment` manifest.

use crate::constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT, NAMESPACE_ENV_VAR};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Command-line and environment configuration for the operator.
#[derive(Parser, Clone, Debug)]
#[command(name = "rethinkdb-operator", version, about = "RethinkDB cluster operator for Kubernetes")]
pub struct Config {
    /// Namespace to watch; empty watches all namespaces
    #[arg(long, env = NAMESPACE_ENV_VAR, default_value = "")]
    pub namespace: String,

    /// Port for the `/metrics` and `/healthz` endpoints
    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, ignore_case = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Namespace to restrict the watch to, or `None` for a cluster-wide watch.
    #[must_use]
    pub fn watch_namespace(&self) -> Option<String> {
        let ns = self.namespace.trim();
        (!ns.is_empty()).then(|| ns.to_string())
    }

    /// Address the metrics server binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bind address is not an IP address.
    pub fn metrics_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = METRICS_SERVER_BIND_ADDRESS.parse()?;
        Ok(SocketAddr::new(ip, self.metrics_port))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
