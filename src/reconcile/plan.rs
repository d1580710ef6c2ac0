// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The decision half of the state machine, a pure function of observable facts.

use crate::error::FingerprintError;
use crate::fingerprint::Fingerprint;
use crate::reconcile::{DesiredSpec, ReconcileTarget};

/// The single step an invocation takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Delete from the backend, then drop the guard token
    Finalize,
    /// Being deleted and our token is already gone; the store will erase it
    AwaitErasure,
    /// Install the guard token before anything touches the backend
    InstallGuard,
    Create {
        fingerprint: Fingerprint,
    },
    Update {
        fingerprint: Fingerprint,
    },
    /// The identity changed since the last push: create under the new one, then
    /// delete the old one
    Relocate {
        from: String,
        fingerprint: Fingerprint,
    },
    /// The spec changes settings the backend cannot update in place
    Reject {
        reason: String,
    },
    InSync,
}

impl Plan {
    pub fn needs_backend(&self) -> bool {
        matches!(
            self,
            Plan::Finalize | Plan::Create { .. } | Plan::Update { .. } | Plan::Relocate { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Finalize => "finalize",
            Plan::AwaitErasure => "await_erasure",
            Plan::InstallGuard => "install_guard",
            Plan::Create { .. } => "create",
            Plan::Update { .. } => "update",
            Plan::Relocate { .. } => "relocate",
            Plan::Reject { .. } => "reject",
            Plan::InSync => "in_sync",
        }
    }
}

/// Decide what to do with `target`.
///
/// Deletion intent wins over everything, so a resource being deleted is never updated
/// first. The fingerprint is only computed on the create/update path, which keeps an
/// unrepresentable spec from blocking deletion.
pub fn plan<S: DesiredSpec>(
    target: &ReconcileTarget<S>,
    guard_token: &str,
) -> Result<Plan, FingerprintError> {
    let guarded = target.guards.contains(guard_token);

    if target.is_being_deleted() {
        return Ok(if guarded {
            Plan::Finalize
        } else {
            Plan::AwaitErasure
        });
    }

    if !guarded {
        return Ok(Plan::InstallGuard);
    }

    let fingerprint = target.spec.fingerprint()?;
    let Some(observed) = target.observed.as_ref().filter(|o| o.is_synchronized()) else {
        return Ok(Plan::Create { fingerprint });
    };

    let identity = target.spec.identity();
    if let Some(from) = observed.identity.as_deref().filter(|from| *from != identity) {
        return Ok(Plan::Relocate {
            from: from.to_string(),
            fingerprint,
        });
    }

    if fingerprint.as_str() == observed.fingerprint {
        return Ok(Plan::InSync);
    }

    // Statuses written before the fixed settings were recorded cannot be checked
    if let (Some(recorded), Some(current)) = (
        observed.immutable_fingerprint.as_deref(),
        target.spec.immutable_fingerprint()?,
    ) {
        if current.as_str() != recorded {
            return Ok(Plan::Reject {
                reason: format!(
                    "{} {} changes settings that are fixed at creation; \
                     move it to a new identity to recreate it",
                    S::KIND,
                    identity
                ),
            });
        }
    }

    Ok(Plan::Update { fingerprint })
}
