// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Status written by the reconciler after a confirmed push to Vault.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    /// Fingerprint of the spec last pushed successfully
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub phase: Phase,
    /// RFC3339 time the phase last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Backend identity the fingerprint was pushed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Fingerprint of the settings the backend fixes at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_fingerprint: Option<String>,
}

impl ObservedState {
    /// A status without a fingerprint has never recorded a push
    pub fn is_synchronized(&self) -> bool {
        self.phase == Phase::Synchronized && !self.fingerprint.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum Phase {
    #[default]
    Pending,
    Synchronized,
}
