// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources reconciled into Vault.

pub mod policy;
pub mod secret_engine;
pub mod status;
pub mod sys_auth;

pub use policy::{Policy, PolicySpec};
pub use secret_engine::{MountConfig, SecretEngine, SecretEngineSpec};
pub use status::{ObservedState, Phase};
pub use sys_auth::{SysAuth, SysAuthSpec};

use crate::reconcile::DesiredSpec;
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A custom resource whose spec is pushed to Vault and whose status records the last push.
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    type Spec: DesiredSpec;

    /// Guard token this operator places on every object of the kind
    const FINALIZER: &'static str;

    fn desired(&self) -> &Self::Spec;

    fn observed(&self) -> Option<&ObservedState>;
}

/// Mount settings Vault fixes when a secret engine or auth method is enabled.
/// The tune endpoint ignores them, so changing one needs a new mount.
#[derive(Serialize)]
pub(crate) struct FixedMountSettings<'a> {
    pub engine_type: &'a str,
    pub local: bool,
    pub seal_wrap: bool,
}
