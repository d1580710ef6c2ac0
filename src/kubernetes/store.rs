// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources as the desired-state store.
//!
//! Guard tokens live in `metadata.finalizers`, observed state in the status
//! subresource. Every write is a merge patch carrying `metadata.resourceVersion`,
//! so the API server rejects it with 409 when the object changed since the read.

use crate::error::StoreError;
use crate::reconcile::{
    DesiredStateStore, GuardSet, ReconcileTarget, Subject, TargetId, TargetUpdate,
};
use crate::types::ManagedResource;
use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use serde_json::{json, Map, Value};
use std::marker::PhantomData;
use tracing::{debug, instrument};

pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ManagedResource> KubeStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, id: &TargetId) -> Api<K> {
        match &id.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

/// Project a custom resource onto the reconciler's view of it
pub fn target_from<K: ManagedResource>(obj: &K) -> ReconcileTarget<K::Spec> {
    let meta = obj.meta();
    ReconcileTarget {
        subject: Subject {
            id: TargetId::new(obj.namespace(), obj.name_any()),
            uid: obj.uid(),
        },
        spec: obj.desired().clone(),
        observed: obj.observed().cloned(),
        deletion_requested_at: meta.deletion_timestamp.as_ref().map(|t| t.0),
        guards: obj.finalizers().iter().cloned().collect::<GuardSet>(),
        resource_version: obj.resource_version(),
        generation: meta.generation,
    }
}

fn store_error(id: &TargetId, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => {
            StoreError::Conflict(format!("{}: {}", id, resp.message))
        }
        kube::Error::Api(resp) if resp.code == 404 => {
            StoreError::NotFound(format!("{}: {}", id, resp.message))
        }
        e => StoreError::Unavailable(format!("{}: {}", id, e)),
    }
}

/// Merge patch body; `resourceVersion` turns it into a conditional write
fn patch_body(resource_version: Option<&str>, update: &TargetUpdate) -> Value {
    let mut metadata = Map::new();
    if let Some(rv) = resource_version {
        metadata.insert("resourceVersion".to_string(), json!(rv));
    }

    match update {
        TargetUpdate::Guards(guards) => {
            metadata.insert("finalizers".to_string(), json!(guards.to_vec()));
            json!({ "metadata": metadata })
        }
        TargetUpdate::Observed(observed) => json!({
            "metadata": metadata,
            "status": observed,
        }),
    }
}

#[async_trait]
impl<K: ManagedResource> DesiredStateStore<K::Spec> for KubeStore<K> {
    #[instrument(skip(self), fields(target = %id))]
    async fn get(&self, id: &TargetId) -> Result<Option<ReconcileTarget<K::Spec>>, StoreError> {
        let obj = self
            .api(id)
            .get_opt(&id.name)
            .await
            .map_err(|e| store_error(id, e))?;
        Ok(obj.as_ref().map(target_from))
    }

    #[instrument(skip(self, update), fields(target = %id))]
    async fn update(
        &self,
        id: &TargetId,
        resource_version: Option<&str>,
        update: TargetUpdate,
    ) -> Result<(), StoreError> {
        let api = self.api(id);
        let body = patch_body(resource_version, &update);
        let params = PatchParams::default();

        match update {
            TargetUpdate::Guards(_) => {
                debug!("Patching finalizers of {}", id);
                api.patch(&id.name, &params, &Patch::Merge(&body)).await
            }
            TargetUpdate::Observed(_) => {
                debug!("Patching status of {}", id);
                api.patch_status(&id.name, &params, &Patch::Merge(&body))
                    .await
            }
        }
        .map(|_| ())
        .map_err(|e| store_error(id, e))
    }
}
