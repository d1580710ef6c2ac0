// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::error::FingerprintError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::reconcile::DesiredSpec;
use crate::types::{FixedMountSettings, ManagedResource, MountConfig, ObservedState};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A Vault auth method enabled under `sys/auth/<path>`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "vault.mountkeeper.dev", version = "v1", kind = "SysAuth")]
#[kube(namespaced, plural = "sysauths")]
#[kube(status = "ObservedState")]
#[kube(printcolumn = r#"{"name":"Path","type":"string","jsonPath":".spec.path"}"#)]
#[kube(printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#)]
#[kube(printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#)]
#[serde(rename_all = "camelCase")]
pub struct SysAuthSpec {
    /// Mount path of the auth method, e.g. `kubernetes` or `team/oidc`
    pub path: String,
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MountConfig>,
}

#[derive(Serialize)]
struct AuthSettings<'a> {
    auth_type: &'a str,
    description: Option<&'a str>,
    local: bool,
    seal_wrap: bool,
    default_lease_ttl: Option<&'a str>,
    max_lease_ttl: Option<&'a str>,
}

impl SysAuthSpec {
    pub fn mount_path(&self) -> &str {
        self.path.trim_matches('/')
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn default_lease_ttl(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.default_lease_ttl.as_deref())
    }

    pub fn max_lease_ttl(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.max_lease_ttl.as_deref())
    }
}

impl DesiredSpec for SysAuthSpec {
    const KIND: &'static str = "sys_auth";

    fn identity(&self) -> &str {
        self.mount_path()
    }

    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        fingerprint(&AuthSettings {
            auth_type: &self.auth_type,
            description: self.description(),
            local: self.local,
            seal_wrap: self.seal_wrap,
            default_lease_ttl: self.default_lease_ttl(),
            max_lease_ttl: self.max_lease_ttl(),
        })
    }

    fn immutable_fingerprint(&self) -> Result<Option<Fingerprint>, FingerprintError> {
        let fixed = FixedMountSettings {
            engine_type: &self.auth_type,
            local: self.local,
            seal_wrap: self.seal_wrap,
        };
        fingerprint(&fixed).map(Some)
    }
}

impl ManagedResource for SysAuth {
    type Spec = SysAuthSpec;

    const FINALIZER: &'static str = finalizers::SYS_AUTH;

    fn desired(&self) -> &SysAuthSpec {
        &self.spec
    }

    fn observed(&self) -> Option<&ObservedState> {
        self.status.as_ref()
    }
}
