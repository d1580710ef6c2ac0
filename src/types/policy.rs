// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::error::FingerprintError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::reconcile::DesiredSpec;
use crate::types::{ManagedResource, ObservedState};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A Vault ACL policy stored under `sys/policies/acl/<name>`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
#[kube(group = "vault.mountkeeper.dev", version = "v1", kind = "Policy")]
#[kube(namespaced, plural = "policies")]
#[kube(status = "ObservedState")]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    /// Policy name in Vault
    pub name: String,
    /// HCL policy document
    pub rules: String,
}

impl DesiredSpec for PolicySpec {
    const KIND: &'static str = "policy";

    fn identity(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        fingerprint(self.rules.as_str())
    }
}

impl ManagedResource for Policy {
    type Spec = PolicySpec;

    const FINALIZER: &'static str = finalizers::POLICY;

    fn desired(&self) -> &PolicySpec {
        &self.spec
    }

    fn observed(&self) -> Option<&ObservedState> {
        self.status.as_ref()
    }
}
