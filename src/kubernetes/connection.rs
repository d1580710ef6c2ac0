// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Vault connection parameters read from a ConfigMap on every attempt

use crate::backend::{Connection, ConnectionResolver};
use crate::constants::connection::{ADDRESS_KEY, TOKEN_KEY};
use crate::error::BackendError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use tracing::{debug, instrument};

pub struct ConfigMapConnection {
    client: Client,
    namespace: String,
    name: String,
}

impl ConfigMapConnection {
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ConnectionResolver for ConfigMapConnection {
    /// A missing ConfigMap or key is transient: the operator may be installed
    /// before Vault is configured.
    #[instrument(skip(self), fields(config_map = %format!("{}/{}", self.namespace, self.name)))]
    async fn resolve(&self) -> Result<Connection, BackendError> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);

        let config_map = config_maps
            .get_opt(&self.name)
            .await
            .map_err(|e| {
                BackendError::Transient(format!(
                    "Failed to read Vault connection ConfigMap {}/{}: {}",
                    self.namespace, self.name, e
                ))
            })?
            .ok_or_else(|| {
                BackendError::Transient(format!(
                    "Vault connection ConfigMap {}/{} does not exist",
                    self.namespace, self.name
                ))
            })?;

        let data = config_map.data.unwrap_or_default();
        let value = |key: &str| {
            data.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    BackendError::Transient(format!(
                        "Vault connection ConfigMap {}/{} has no '{}' key",
                        self.namespace, self.name, key
                    ))
                })
        };

        let connection = Connection {
            address: value(ADDRESS_KEY)?,
            token: value(TOKEN_KEY)?,
        };
        debug!("Resolved Vault connection to {}", connection.address);
        Ok(connection)
    }
}
