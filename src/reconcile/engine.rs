// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::backend::{BackendGateway, ConnectionResolver, Connector};
use crate::constants::reasons;
use crate::error::{BackendError, ReconcileError, Result};
use crate::events::{CallOutcome, Event, EventSink};
use crate::fingerprint::Fingerprint;
use crate::reconcile::{
    plan, DesiredSpec, DesiredStateStore, Plan, ReconcileTarget, TargetId, TargetUpdate,
};
use crate::types::{ObservedState, Phase};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// What a successful invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The object no longer exists in the store
    Gone,
    AwaitingErasure,
    GuardInstalled,
    Created,
    Updated,
    Relocated,
    InSync,
    Finalized,
}

/// Executes the state machine for one kind of desired state.
pub struct Reconciler<S: DesiredSpec> {
    pub(super) store: Arc<dyn DesiredStateStore<S>>,
    connections: Arc<dyn ConnectionResolver>,
    connector: Arc<dyn Connector<S>>,
    pub(super) events: Arc<dyn EventSink>,
    pub(super) guard_token: String,
    backend_timeout: Duration,
}

impl<S: DesiredSpec> Reconciler<S> {
    pub fn new(
        store: Arc<dyn DesiredStateStore<S>>,
        connections: Arc<dyn ConnectionResolver>,
        connector: Arc<dyn Connector<S>>,
        events: Arc<dyn EventSink>,
        guard_token: &str,
        backend_timeout: Duration,
    ) -> Self {
        Self {
            store,
            connections,
            connector,
            events,
            guard_token: guard_token.to_string(),
            backend_timeout,
        }
    }

    /// Run one attempt for `id`.
    ///
    /// Either the attempt's single persisted change commits, or nothing does. Failures
    /// other than conflicts are published as warning events before being returned.
    #[instrument(skip(self, id), fields(kind = S::KIND, target = %id))]
    pub async fn reconcile(&self, id: &TargetId) -> Result<Outcome> {
        let Some(target) = self.store.get(id).await? else {
            debug!("Target {} no longer exists, nothing to do", id);
            return Ok(Outcome::Gone);
        };

        match self.execute(&target).await {
            Ok(outcome) => {
                debug!("Reconciled {}: {:?}", id, outcome);
                Ok(outcome)
            }
            Err(err) => {
                if err.is_user_visible() {
                    warn!("Reconcile of {} failed: {}", id, err);
                    self.events
                        .publish(&target.subject, Event::warning(err.reason(), err.to_string()))
                        .await;
                } else {
                    debug!("Reconcile of {} abandoned: {}", id, err);
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, target: &ReconcileTarget<S>) -> Result<Outcome> {
        let plan = plan(target, &self.guard_token)?;
        debug!(
            "Planned {} for {} (backend: {})",
            plan.name(),
            target.id(),
            plan.needs_backend()
        );

        match plan {
            Plan::AwaitErasure => Ok(Outcome::AwaitingErasure),
            Plan::InSync => Ok(Outcome::InSync),
            Plan::InstallGuard => self.install_guard(target).await,
            Plan::Reject { reason } => Err(ReconcileError::Config(reason)),
            Plan::Finalize => {
                let gateway = self.gateway().await?;
                self.finalize(target, gateway.as_ref()).await
            }
            Plan::Create { fingerprint } => {
                let observed = stamp(target, fingerprint)?;
                let gateway = self.gateway().await?;
                self.create(target, gateway.as_ref(), observed).await
            }
            Plan::Update { fingerprint } => {
                let observed = stamp(target, fingerprint)?;
                let gateway = self.gateway().await?;
                self.update(target, gateway.as_ref(), observed).await
            }
            Plan::Relocate { from, fingerprint } => {
                let observed = stamp(target, fingerprint)?;
                let gateway = self.gateway().await?;
                self.relocate(target, gateway.as_ref(), &from, observed).await
            }
        }
    }

    /// Resolved per attempt; only plans that touch the backend need it.
    async fn gateway(&self) -> Result<Arc<dyn BackendGateway<S>>> {
        let connection = self.connections.resolve().await?;
        debug!("Resolved backend connection to {}", connection.address);
        Ok(self.connector.connect(&connection)?)
    }

    async fn create(
        &self,
        target: &ReconcileTarget<S>,
        gateway: &dyn BackendGateway<S>,
        observed: ObservedState,
    ) -> Result<Outcome> {
        let identity = target.spec.identity();
        info!("Creating {} {}", S::KIND, identity);

        self.push_new(&target.spec, gateway).await?;
        self.persist(target, observed).await?;
        self.events
            .publish(
                &target.subject,
                Event::normal(
                    reasons::CREATED,
                    format!("{} {} is created", S::KIND, identity),
                ),
            )
            .await;
        Ok(Outcome::Created)
    }

    async fn update(
        &self,
        target: &ReconcileTarget<S>,
        gateway: &dyn BackendGateway<S>,
        observed: ObservedState,
    ) -> Result<Outcome> {
        let identity = target.spec.identity();
        info!("Updating {} {} to {}", S::KIND, identity, observed.fingerprint);

        match self.call("update", gateway.update(&target.spec)).await {
            Ok(()) => {}
            Err(BackendError::NotFound(msg)) => {
                info!(
                    "{} {} is missing from backend ({}), creating it",
                    S::KIND,
                    identity,
                    msg
                );
                match self.call("create", gateway.create(&target.spec)).await {
                    Ok(()) | Err(BackendError::AlreadyExists(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }

        self.persist(target, observed).await?;
        self.events
            .publish(
                &target.subject,
                Event::normal(
                    reasons::UPDATED,
                    format!("{} {} is updated", S::KIND, identity),
                ),
            )
            .await;
        Ok(Outcome::Updated)
    }

    /// The new identity is created first, so a rejected or failed create leaves the
    /// resource under the old identity untouched. The old one is deleted only once the
    /// new one exists; both stay covered by the guard until the status records the move.
    async fn relocate(
        &self,
        target: &ReconcileTarget<S>,
        gateway: &dyn BackendGateway<S>,
        from: &str,
        observed: ObservedState,
    ) -> Result<Outcome> {
        let identity = target.spec.identity();
        info!("Moving {} {} to {}", S::KIND, from, identity);

        self.push_new(&target.spec, gateway).await?;
        match self.call("delete", gateway.delete(from)).await {
            Ok(()) | Err(BackendError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        self.persist(target, observed).await?;
        self.events
            .publish(
                &target.subject,
                Event::normal(
                    reasons::RELOCATED,
                    format!("{} {} is moved to {}", S::KIND, from, identity),
                ),
            )
            .await;
        Ok(Outcome::Relocated)
    }

    /// Create `spec`, or overwrite what an earlier attempt left behind.
    async fn push_new(&self, spec: &S, gateway: &dyn BackendGateway<S>) -> Result<()> {
        match self.call("create", gateway.create(spec)).await {
            Ok(()) => Ok(()),
            Err(BackendError::AlreadyExists(msg)) => {
                // Left behind by an attempt that died before persisting; push the
                // current spec so the recorded fingerprint matches the backend.
                info!(
                    "{} {} already exists ({}), updating it instead",
                    S::KIND,
                    spec.identity(),
                    msg
                );
                Ok(self.call("update", gateway.update(spec)).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, target: &ReconcileTarget<S>, observed: ObservedState) -> Result<()> {
        self.store
            .update(
                target.id(),
                target.resource_version.as_deref(),
                TargetUpdate::Observed(observed),
            )
            .await?;
        Ok(())
    }

    /// Run one backend call under the attempt deadline and record its latency.
    /// An expired deadline is a transient failure, never a success.
    pub(super) async fn call<T>(
        &self,
        action: &'static str,
        call: impl Future<Output = std::result::Result<T, BackendError>>,
    ) -> std::result::Result<T, BackendError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.backend_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transient(format!(
                "{} timed out after {:?}",
                action, self.backend_timeout
            ))),
        };

        let outcome = match &result {
            Ok(_) | Err(BackendError::AlreadyExists(_) | BackendError::NotFound(_)) => {
                CallOutcome::Success
            }
            Err(_) => CallOutcome::Failure,
        };
        self.events.observe(S::KIND, action, outcome, started.elapsed());
        result
    }
}

/// Status recorded once the push of `target` is confirmed. Built before the push, so a
/// spec that cannot be fingerprinted never reaches the backend.
fn stamp<S: DesiredSpec>(
    target: &ReconcileTarget<S>,
    fingerprint: Fingerprint,
) -> Result<ObservedState> {
    let previous = target.observed.as_ref();
    let last_transition_time = match previous {
        Some(p) if p.phase == Phase::Synchronized && p.last_transition_time.is_some() => {
            p.last_transition_time.clone()
        }
        _ => Some(Utc::now().to_rfc3339()),
    };

    Ok(ObservedState {
        fingerprint: fingerprint.to_string(),
        phase: Phase::Synchronized,
        last_transition_time,
        observed_generation: target.generation,
        identity: Some(target.spec.identity().to_string()),
        immutable_fingerprint: target
            .spec
            .immutable_fingerprint()?
            .map(|f| f.to_string()),
    })
}
