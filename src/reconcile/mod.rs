// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Level-triggered reconciliation of one desired-state object against its backend.
//!
//! Every invocation re-reads the target, derives a [`Plan`] from the observable facts
//! alone and executes it. Nothing is kept between invocations; the store holds the only
//! durable state (observed status and guard tokens).
//!
//! Callers must not run two invocations for the same identity concurrently. The
//! kube-runtime controller guarantees this by serializing reconciles per object.

mod engine;
mod finalizer;
pub mod plan;
pub mod target;

pub use engine::{Outcome, Reconciler};
pub use plan::{plan, Plan};
pub use target::{GuardSet, ReconcileTarget, Subject, TargetId, TargetUpdate};

use crate::error::{FingerprintError, StoreError};
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use std::fmt::Debug;

/// The desired-state half of a reconcile target.
pub trait DesiredSpec: Clone + Debug + Send + Sync + 'static {
    /// Short label used in logs, events and metrics
    const KIND: &'static str;

    /// Name of the resource in the backend
    fn identity(&self) -> &str;

    /// Hash of everything a user expects to be applied when it changes
    fn fingerprint(&self) -> Result<Fingerprint, FingerprintError>;

    /// Hash of the settings the backend fixes when the resource is created and
    /// cannot update in place. `None` when every setting can be updated.
    fn immutable_fingerprint(&self) -> Result<Option<Fingerprint>, FingerprintError> {
        Ok(None)
    }
}

/// Storage holding desired state, observed state and guard tokens.
///
/// Writes are conditional on `resource_version`; a stale version fails with
/// [`StoreError::Conflict`] instead of overwriting.
#[async_trait]
pub trait DesiredStateStore<S: DesiredSpec>: Send + Sync {
    async fn get(&self, id: &TargetId) -> Result<Option<ReconcileTarget<S>>, StoreError>;

    async fn update(
        &self,
        id: &TargetId,
        resource_version: Option<&str>,
        update: TargetUpdate,
    ) -> Result<(), StoreError>;
}
