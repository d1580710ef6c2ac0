// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Vault HTTP adapter for secret-engine mounts, auth methods and ACL policies.

use crate::backend::{BackendGateway, BackendSnapshot, Connection, Connector};
use crate::error::BackendError;
use crate::reconcile::DesiredSpec;
use crate::types::{MountConfig, PolicySpec, SecretEngineSpec, SysAuthSpec};
use async_trait::async_trait;
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Vault client bound to one resolved connection.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl VaultClient {
    pub fn new(connection: &Connection) -> Result<Self, BackendError> {
        let mut base = Url::parse(&connection.address).map_err(|e| {
            BackendError::Transient(format!(
                "Invalid Vault address '{}': {}",
                connection.address, e
            ))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token: connection.token.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| BackendError::Rejected(format!("Invalid Vault path '{}': {}", path, e)))
    }

    #[instrument(skip(self, body))]
    async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Option<Value>, BackendError> {
        let mut request = self
            .http
            .request(method, self.url(path)?)
            .header(TOKEN_HEADER, &self.token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transient(format!("Request to {} failed: {}", path, e)))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            BackendError::Transient(format!("Failed to read response from {}: {}", path, e))
        })?;
        debug!("Vault answered {} for {}", status, path);

        if !status.is_success() {
            return Err(classify(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text).map(Some).map_err(|e| {
            BackendError::Transient(format!("Invalid response from {}: {}", path, e))
        })
    }
}

/// Map a failed Vault response onto the gateway's error kinds
pub fn classify(status: StatusCode, body: &str) -> BackendError {
    let message = error_message(status, body);
    let lowered = message.to_lowercase();

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::BAD_REQUEST if lowered.contains("already in use") => {
            BackendError::AlreadyExists(message)
        }
        StatusCode::BAD_REQUEST
            if lowered.contains("no matching mount")
                || lowered.contains("no mount entry")
                || lowered.contains("cannot fetch sysview") =>
        {
            BackendError::NotFound(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Rejected(message)
        }
        _ => BackendError::Transient(message),
    }
}

/// Vault reports failures as `{"errors": ["..."]}`
fn error_message(status: StatusCode, body: &str) -> String {
    let errors = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("errors").and_then(Value::as_array).cloned())
        .map(|errors| {
            errors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|joined| !joined.is_empty());

    match errors {
        Some(errors) => format!("{}: {}", status, errors),
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{}: {}", status, body.trim()),
    }
}

#[derive(Serialize)]
struct MountRequest<'a> {
    #[serde(rename = "type")]
    engine_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    local: bool,
    seal_wrap: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, String>,
    config: LeaseConfig<'a>,
}

#[derive(Serialize)]
struct LeaseConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    default_lease_ttl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_lease_ttl: Option<&'a str>,
}

#[derive(Serialize)]
struct TuneRequest<'a> {
    description: &'a str,
    #[serde(flatten)]
    leases: LeaseConfig<'a>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, String>,
}

fn leases(config: Option<&MountConfig>) -> LeaseConfig<'_> {
    LeaseConfig {
        default_lease_ttl: config.and_then(|c| c.default_lease_ttl.as_deref()),
        max_lease_ttl: config.and_then(|c| c.max_lease_ttl.as_deref()),
    }
}

/// Identities of a `sys/mounts` or `sys/auth` listing. Newer Vault versions nest the
/// table under `data`; entries are keyed by path with a trailing slash.
fn mount_table(response: &Value) -> BackendSnapshot {
    let table = response.get("data").unwrap_or(response);
    let identities = table
        .as_object()
        .map(|mounts| {
            mounts
                .iter()
                .filter(|(path, entry)| path.ends_with('/') && entry.is_object())
                .map(|(path, _)| path.trim_end_matches('/').to_string())
                .collect()
        })
        .unwrap_or_default();
    BackendSnapshot { identities }
}

#[async_trait]
impl BackendGateway<SecretEngineSpec> for VaultClient {
    async fn create(&self, spec: &SecretEngineSpec) -> Result<(), BackendError> {
        let body = MountRequest {
            engine_type: &spec.engine_type,
            description: spec.description(),
            local: spec.local,
            seal_wrap: spec.seal_wrap,
            options: spec.effective_options(),
            config: leases(spec.config.as_ref()),
        };
        let path = format!("sys/mounts/{}", spec.identity());
        self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(())
    }

    /// Tunes the mount in place. Vault cannot change `type`, `local` or
    /// `seal_wrap` of an existing mount; those need a delete and recreate.
    async fn update(&self, spec: &SecretEngineSpec) -> Result<(), BackendError> {
        let body = TuneRequest {
            description: spec.description().unwrap_or_default(),
            leases: leases(spec.config.as_ref()),
            options: spec.effective_options(),
        };
        let path = format!("sys/mounts/{}/tune", spec.identity());
        self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn delete(&self, identity: &str) -> Result<(), BackendError> {
        let path = format!("sys/mounts/{}", identity);
        self.send::<Value>(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn list(&self) -> Result<BackendSnapshot, BackendError> {
        let response = self
            .send::<Value>(Method::GET, "sys/mounts", &[], None)
            .await?
            .unwrap_or(Value::Null);
        Ok(mount_table(&response))
    }
}

#[async_trait]
impl BackendGateway<SysAuthSpec> for VaultClient {
    async fn create(&self, spec: &SysAuthSpec) -> Result<(), BackendError> {
        let body = MountRequest {
            engine_type: &spec.auth_type,
            description: spec.description(),
            local: spec.local,
            seal_wrap: spec.seal_wrap,
            options: BTreeMap::new(),
            config: leases(spec.config.as_ref()),
        };
        let path = format!("sys/auth/{}", spec.identity());
        self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(())
    }

    /// Tunes description and lease TTLs; the auth type is fixed at enable time.
    async fn update(&self, spec: &SysAuthSpec) -> Result<(), BackendError> {
        let body = TuneRequest {
            description: spec.description().unwrap_or_default(),
            leases: leases(spec.config.as_ref()),
            options: BTreeMap::new(),
        };
        let path = format!("sys/auth/{}/tune", spec.identity());
        self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn delete(&self, identity: &str) -> Result<(), BackendError> {
        let path = format!("sys/auth/{}", identity);
        self.send::<Value>(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn list(&self) -> Result<BackendSnapshot, BackendError> {
        let response = self
            .send::<Value>(Method::GET, "sys/auth", &[], None)
            .await?
            .unwrap_or(Value::Null);
        Ok(mount_table(&response))
    }
}

#[derive(Serialize)]
struct PolicyRequest<'a> {
    policy: &'a str,
}

#[async_trait]
impl BackendGateway<PolicySpec> for VaultClient {
    /// Policy writes are upserts, so create never reports AlreadyExists
    async fn create(&self, spec: &PolicySpec) -> Result<(), BackendError> {
        let path = format!("sys/policies/acl/{}", spec.identity());
        let body = PolicyRequest { policy: &spec.rules };
        self.send(Method::PUT, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn update(&self, spec: &PolicySpec) -> Result<(), BackendError> {
        BackendGateway::<PolicySpec>::create(self, spec).await
    }

    async fn delete(&self, identity: &str) -> Result<(), BackendError> {
        let path = format!("sys/policies/acl/{}", identity);
        self.send::<Value>(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn list(&self) -> Result<BackendSnapshot, BackendError> {
        let response = match self
            .send::<Value>(Method::GET, "sys/policies/acl", &[("list", "true")], None)
            .await
        {
            Ok(response) => response.unwrap_or(Value::Null),
            // Vault answers a LIST with nothing in it with 404
            Err(BackendError::NotFound(_)) => return Ok(BackendSnapshot::default()),
            Err(e) => return Err(e),
        };

        let identities = response
            .pointer("/data/keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(BackendSnapshot { identities })
    }
}

/// Builds a fresh [`VaultClient`] for every resolved connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultConnector;

impl<S: DesiredSpec> Connector<S> for VaultConnector
where
    VaultClient: BackendGateway<S>,
{
    fn connect(
        &self,
        connection: &Connection,
    ) -> Result<Arc<dyn BackendGateway<S>>, BackendError> {
        Ok(Arc::new(VaultClient::new(connection)?))
    }
}
