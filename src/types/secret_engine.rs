// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::error::FingerprintError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::reconcile::DesiredSpec;
use crate::types::{FixedMountSettings, ManagedResource, ObservedState};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Vault secret engine mounted under `sys/mounts/<path>`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "vault.mountkeeper.dev", version = "v1", kind = "SecretEngine")]
#[kube(namespaced, plural = "secretengines", shortname = "se")]
#[kube(status = "ObservedState")]
#[kube(printcolumn = r#"{"name":"Path","type":"string","jsonPath":".spec.path"}"#)]
#[kube(printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#)]
#[serde(rename_all = "camelCase")]
pub struct SecretEngineSpec {
    /// Mount path, also the identity of the engine in Vault
    pub path: String,
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
    /// Engine version, e.g. 2 for KV v2. Shorthand for `options.version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MountConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MountConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lease_ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lease_ttl: Option<String>,
}

/// The fields of a secret engine that convergence depends on, normalized.
#[derive(Serialize)]
struct EngineSettings<'a> {
    engine_type: &'a str,
    description: Option<&'a str>,
    local: bool,
    seal_wrap: bool,
    options: BTreeMap<String, String>,
    default_lease_ttl: Option<&'a str>,
    max_lease_ttl: Option<&'a str>,
}

impl SecretEngineSpec {
    /// Mount path without surrounding slashes
    pub fn mount_path(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// Options as sent to Vault, with `version` folded in
    pub fn effective_options(&self) -> BTreeMap<String, String> {
        let mut options = self.options.clone();
        if let Some(version) = self.version {
            options.insert("version".to_string(), version.to_string());
        }
        options
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    fn settings(&self) -> EngineSettings<'_> {
        let config = self.config.as_ref();
        EngineSettings {
            engine_type: &self.engine_type,
            description: self.description(),
            local: self.local,
            seal_wrap: self.seal_wrap,
            options: self.effective_options(),
            default_lease_ttl: config.and_then(|c| c.default_lease_ttl.as_deref()),
            max_lease_ttl: config.and_then(|c| c.max_lease_ttl.as_deref()),
        }
    }
}

impl DesiredSpec for SecretEngineSpec {
    const KIND: &'static str = "secret_engine";

    fn identity(&self) -> &str {
        self.mount_path()
    }

    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        fingerprint(&self.settings())
    }

    fn immutable_fingerprint(&self) -> Result<Option<Fingerprint>, FingerprintError> {
        let fixed = FixedMountSettings {
            engine_type: &self.engine_type,
            local: self.local,
            seal_wrap: self.seal_wrap,
        };
        fingerprint(&fixed).map(Some)
    }
}

impl ManagedResource for SecretEngine {
    type Spec = SecretEngineSpec;

    const FINALIZER: &'static str = finalizers::SECRET_ENGINE;

    fn desired(&self) -> &SecretEngineSpec {
        &self.spec
    }

    fn observed(&self) -> Option<&ObservedState> {
        self.status.as_ref()
    }
}
