// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watches one custom resource kind and drives the reconciler for every change.

use crate::backend::Connector;
use crate::config::Config;
use crate::error::{ReconcileError, Result};
use crate::kubernetes::{ConfigMapConnection, KubeEventSink, KubeStore};
use crate::reconcile::{Reconciler, TargetId};
use crate::types::ManagedResource;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct ResourceReconciler<K: ManagedResource> {
    client: Client,
    reconciler: Reconciler<K::Spec>,
    transient_requeue: Duration,
    conflict_requeue: Duration,
}

impl<K: ManagedResource> ResourceReconciler<K> {
    pub fn new(client: Client, config: &Config, connector: Arc<dyn Connector<K::Spec>>) -> Self {
        let reconciler = Reconciler::new(
            Arc::new(KubeStore::<K>::new(client.clone())),
            Arc::new(ConfigMapConnection::new(
                client.clone(),
                &config.connection_namespace,
                &config.connection_name,
            )),
            connector,
            Arc::new(KubeEventSink::<K>::new(client.clone())),
            K::FINALIZER,
            config.backend_timeout,
        );

        Self {
            client,
            reconciler,
            transient_requeue: config.transient_requeue,
            conflict_requeue: config.conflict_requeue,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let resources: Api<K> = Api::all(self.client.clone());
        let context = Arc::new(self);
        info!("Starting {} controller", K::kind(&()));

        Controller::new(resources, WatcherConfig::default())
            .run(reconcile::<K>, error_policy::<K>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    fn requeue_for(&self, error: &ReconcileError) -> Action {
        match error {
            // Nothing changes until the spec does
            ReconcileError::Config(_) => Action::await_change(),
            ReconcileError::Conflict(_) => Action::requeue(self.conflict_requeue),
            ReconcileError::Transient(_) => Action::requeue(self.transient_requeue),
        }
    }
}

fn target_id<K: ManagedResource>(obj: &K) -> TargetId {
    TargetId::new(obj.namespace(), obj.name_any())
}

async fn reconcile<K: ManagedResource>(
    obj: Arc<K>,
    ctx: Arc<ResourceReconciler<K>>,
) -> Result<Action> {
    let outcome = ctx.reconciler.reconcile(&target_id(obj.as_ref())).await?;
    debug!("{} {}: {:?}", K::kind(&()), obj.name_any(), outcome);

    // Level-triggered: the watcher redrives on every change, including our own writes
    Ok(Action::await_change())
}

fn error_policy<K: ManagedResource>(
    obj: Arc<K>,
    error: &ReconcileError,
    ctx: Arc<ResourceReconciler<K>>,
) -> Action {
    match error {
        ReconcileError::Conflict(_) => {
            debug!("Reconciling {} raced a concurrent write: {}", obj.name_any(), error)
        }
        _ => error!(
            "Reconciliation error for {} {}: {}",
            K::kind(&()),
            obj.name_any(),
            error
        ),
    }
    ctx.requeue_for(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::VaultConnector;
    use crate::test_utils::MockService;
    use crate::types::{Policy, PolicySpec};
    use kube::api::ObjectMeta;

    fn reconciler() -> ResourceReconciler<Policy> {
        let config = Config {
            transient_requeue: Duration::from_secs(45),
            conflict_requeue: Duration::from_secs(2),
            ..Config::default()
        };
        ResourceReconciler::new(
            MockService::new().into_client(),
            &config,
            Arc::new(VaultConnector),
        )
    }

    #[tokio::test]
    async fn test_requeue_follows_error_kind() {
        let ctx = reconciler();

        assert_eq!(
            ctx.requeue_for(&ReconcileError::Config("bad".to_string())),
            Action::await_change()
        );
        assert_eq!(
            ctx.requeue_for(&ReconcileError::Conflict("stale".to_string())),
            Action::requeue(Duration::from_secs(2))
        );
        assert_eq!(
            ctx.requeue_for(&ReconcileError::Transient("sealed".to_string())),
            Action::requeue(Duration::from_secs(45))
        );
    }

    #[test]
    fn test_target_id_from_object() {
        let policy = Policy {
            metadata: ObjectMeta {
                name: Some("ops".to_string()),
                namespace: Some("team-a".to_string()),
                ..Default::default()
            },
            spec: PolicySpec {
                name: "ops".to_string(),
                rules: String::new(),
            },
            status: None,
        };

        assert_eq!(target_id(&policy), TargetId::namespaced("team-a", "ops"));
    }

    #[tokio::test]
    async fn test_vanished_object_awaits_change() {
        let ctx = Arc::new(reconciler());
        let policy = Policy::new(
            "ops",
            PolicySpec {
                name: "ops".to_string(),
                rules: String::new(),
            },
        );

        let action = reconcile(Arc::new(policy), ctx).await.unwrap();

        assert_eq!(action, Action::await_change());
    }
}
