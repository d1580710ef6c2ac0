// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes controllers that react to watch events.

pub mod resource;

pub use resource::ResourceReconciler;

use crate::types::{Policy, SecretEngine, SysAuth};

pub type SecretEngineReconciler = ResourceReconciler<SecretEngine>;
pub type PolicyReconciler = ResourceReconciler<Policy>;
pub type SysAuthReconciler = ResourceReconciler<SysAuth>;
