// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Guard-token protocol: the token goes on before the backend is touched and comes off
//! only after the backend resource is confirmed gone.

use crate::backend::BackendGateway;
use crate::constants::reasons;
use crate::error::{BackendError, Result};
use crate::events::Event;
use crate::reconcile::{DesiredSpec, Outcome, ReconcileTarget, Reconciler, TargetUpdate};
use tracing::info;

impl<S: DesiredSpec> Reconciler<S> {
    /// Absent -> Present. Persisted on its own so a crash after a later backend create
    /// can never leave an unguarded resource behind.
    pub(super) async fn install_guard(&self, target: &ReconcileTarget<S>) -> Result<Outcome> {
        let mut guards = target.guards.clone();
        guards.add(&self.guard_token);

        info!("Adding finalizer {} to {}", self.guard_token, target.id());
        self.store
            .update(
                target.id(),
                target.resource_version.as_deref(),
                TargetUpdate::Guards(guards),
            )
            .await?;

        self.events
            .publish(
                &target.subject,
                Event::normal(reasons::GUARD_ADDED, "object finalizer is added"),
            )
            .await;
        Ok(Outcome::GuardInstalled)
    }

    /// Present + deletion intent -> backend delete -> Absent.
    ///
    /// Deletes the identity the status recorded as pushed, and the current spec identity
    /// when it differs, since an unfinished move may have created it. On a failed delete
    /// the token stays, so the store keeps the object and keeps redelivering it until the
    /// delete goes through.
    pub(super) async fn finalize(
        &self,
        target: &ReconcileTarget<S>,
        gateway: &dyn BackendGateway<S>,
    ) -> Result<Outcome> {
        let current = target.spec.identity();
        let recorded = target
            .observed
            .as_ref()
            .and_then(|o| o.identity.as_deref())
            .unwrap_or(current);
        let mut identities = vec![recorded];
        if recorded != current {
            identities.push(current);
        }

        for identity in &identities {
            info!("Deleting {} {} before releasing {}", S::KIND, identity, target.id());
            match self.call("delete", gateway.delete(identity)).await {
                Ok(()) => {}
                Err(BackendError::NotFound(msg)) => {
                    info!("{} {} already absent from backend: {}", S::KIND, identity, msg);
                }
                Err(err) => return Err(err.into()),
            }
        }

        let mut guards = target.guards.clone();
        guards.remove(&self.guard_token);
        self.store
            .update(
                target.id(),
                target.resource_version.as_deref(),
                TargetUpdate::Guards(guards),
            )
            .await?;

        self.events
            .publish(
                &target.subject,
                Event::normal(
                    reasons::DELETED,
                    format!("{} {} is deleted", S::KIND, identities.join(", ")),
                ),
            )
            .await;
        Ok(Outcome::Finalized)
    }
}
