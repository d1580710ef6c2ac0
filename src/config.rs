// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::connection;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding the Vault connection ConfigMap
    pub connection_namespace: String,
    /// Name of the Vault connection ConfigMap
    pub connection_name: String,
    /// Deadline for a single Vault call
    pub backend_timeout: Duration,
    /// Requeue delay after a transient failure
    pub transient_requeue: Duration,
    /// Requeue delay after an optimistic-concurrency conflict
    pub conflict_requeue: Duration,
    pub metrics_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            connection_namespace: connection::DEFAULT_NAMESPACE.to_string(),
            connection_name: connection::DEFAULT_NAME.to_string(),
            backend_timeout: Duration::from_secs(30),
            transient_requeue: Duration::from_secs(30),
            conflict_requeue: Duration::from_secs(1),
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(v) => v
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", key, v)),
                None => Ok(default),
            }
        };

        let metrics_addr = match lookup("METRICS_ADDR") {
            Some(v) => v
                .parse()
                .with_context(|| format!("METRICS_ADDR is not a socket address: '{}'", v))?,
            None => defaults.metrics_addr,
        };

        Ok(Config {
            connection_namespace: lookup("VAULT_CONFIG_NAMESPACE")
                .unwrap_or(defaults.connection_namespace),
            connection_name: lookup("VAULT_CONFIG_NAME").unwrap_or(defaults.connection_name),
            backend_timeout: secs("BACKEND_TIMEOUT_SECS", defaults.backend_timeout)?,
            transient_requeue: secs("TRANSIENT_REQUEUE_SECS", defaults.transient_requeue)?,
            conflict_requeue: secs("CONFLICT_REQUEUE_SECS", defaults.conflict_requeue)?,
            metrics_addr,
        })
    }
}
