// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes Events for reconciled objects, and Vault latency into Prometheus

use crate::constants::OPERATOR_NAME;
use crate::events::{CallOutcome, Event, EventSink, Severity};
use crate::metrics;
use crate::reconcile::Subject;
use crate::types::ManagedResource;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{
    runtime::events::{Event as KubeEvent, EventType, Recorder, Reporter},
    Client,
};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::warn;

const ACTION: &str = "Reconcile";

pub struct KubeEventSink<K> {
    recorder: Recorder,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ManagedResource> KubeEventSink<K> {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: OPERATOR_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
            _kind: PhantomData,
        }
    }
}

fn object_reference<K: ManagedResource>(subject: &Subject) -> ObjectReference {
    ObjectReference {
        api_version: Some(K::api_version(&()).to_string()),
        kind: Some(K::kind(&()).to_string()),
        name: Some(subject.id.name.clone()),
        namespace: subject.id.namespace.clone(),
        uid: subject.uid.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl<K: ManagedResource> EventSink for KubeEventSink<K> {
    async fn publish(&self, subject: &Subject, event: Event) {
        let type_ = match event.severity {
            Severity::Normal => EventType::Normal,
            Severity::Warning => EventType::Warning,
        };
        let kube_event = KubeEvent {
            type_,
            reason: event.reason,
            note: Some(event.message),
            action: ACTION.to_string(),
            secondary: None,
        };

        if let Err(e) = self
            .recorder
            .publish(&kube_event, &object_reference::<K>(subject))
            .await
        {
            warn!("Failed to publish event for {}: {}", subject.id, e);
        }
    }

    fn observe(
        &self,
        kind: &'static str,
        action: &'static str,
        outcome: CallOutcome,
        elapsed: Duration,
    ) {
        metrics::observe_request(kind, action, outcome, elapsed);
    }
}
