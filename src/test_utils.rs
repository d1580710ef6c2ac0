// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API plus in-memory fakes of the store, backend
//! and event sink.

use crate::backend::{BackendGateway, BackendSnapshot, Connection, ConnectionResolver, Connector};
use crate::error::{BackendError, StoreError};
use crate::events::{CallOutcome, Event, EventSink};
use crate::reconcile::{
    DesiredSpec, DesiredStateStore, GuardSet, ReconcileTarget, Reconciler, Subject, TargetId,
    TargetUpdate,
};
use crate::types::SecretEngineSpec;
use async_trait::async_trait;
use chrono::Utc;
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = (req.method().to_string(), req.uri().path().to_string());
        let response = self.responses.lock().unwrap().get(&key).cloned();

        Box::pin(async move {
            let (status, body) =
                response.unwrap_or_else(|| (404, not_found_json("object", &key.1)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Kubernetes Status response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a mock ConfigMap JSON response
pub fn config_map_json(namespace: &str, name: &str, data: &[(&str, &str)]) -> String {
    let data: BTreeMap<&str, &str> = data.iter().copied().collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": namespace, "uid": "cm-uid" },
        "data": data
    })
    .to_string()
}

/// The KV v2 engine used throughout the reconciler tests
pub fn kv_engine(version: u32) -> SecretEngineSpec {
    SecretEngineSpec {
        path: "kv2".to_string(),
        engine_type: "kv".to_string(),
        description: None,
        local: false,
        seal_wrap: false,
        version: Some(version),
        options: BTreeMap::new(),
        config: None,
    }
}

/// In-memory desired-state store with resource-version preconditions.
pub struct MemoryStore<S> {
    objects: Mutex<HashMap<TargetId, ReconcileTarget<S>>>,
    version: AtomicU64,
    fail_next: Mutex<Option<StoreError>>,
}

impl<S: DesiredSpec> MemoryStore<S> {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            version: AtomicU64::new(1),
            fail_next: Mutex::new(None),
        }
    }

    fn next_version(&self) -> Option<String> {
        Some(self.version.fetch_add(1, Ordering::SeqCst).to_string())
    }

    pub fn insert(&self, id: &TargetId, spec: S, guards: &[&str]) {
        let target = ReconcileTarget {
            subject: Subject {
                id: id.clone(),
                uid: Some(format!("uid-{}", id.name)),
            },
            spec,
            observed: None,
            deletion_requested_at: None,
            guards: guards.iter().copied().collect::<GuardSet>(),
            resource_version: self.next_version(),
            generation: Some(1),
        };
        self.objects.lock().unwrap().insert(id.clone(), target);
    }

    /// Snapshot of a stored target
    pub fn target(&self, id: &TargetId) -> ReconcileTarget<S> {
        self.objects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .expect("target not in store")
    }

    /// Simulate a user edit of the desired state
    pub fn edit_spec(&self, id: &TargetId, spec: S) {
        let version = self.next_version();
        let mut objects = self.objects.lock().unwrap();
        let target = objects.get_mut(id).expect("target not in store");
        target.spec = spec;
        target.generation = target.generation.map(|g| g + 1);
        target.resource_version = version;
    }

    /// Simulate the owner deleting the object
    pub fn request_deletion(&self, id: &TargetId) {
        let version = self.next_version();
        let mut objects = self.objects.lock().unwrap();
        let target = objects.get_mut(id).expect("target not in store");
        target.deletion_requested_at = Some(Utc::now());
        target.resource_version = version;
    }

    pub fn fail_next_update(&self, err: StoreError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl<S: DesiredSpec> DesiredStateStore<S> for MemoryStore<S> {
    async fn get(&self, id: &TargetId) -> Result<Option<ReconcileTarget<S>>, StoreError> {
        Ok(self.objects.lock().unwrap().get(id).cloned())
    }

    async fn update(
        &self,
        id: &TargetId,
        resource_version: Option<&str>,
        update: TargetUpdate,
    ) -> Result<(), StoreError> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        let version = self.next_version();
        let mut objects = self.objects.lock().unwrap();
        let Some(target) = objects.get_mut(id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if resource_version.is_some() && target.resource_version.as_deref() != resource_version {
            return Err(StoreError::Conflict(id.to_string()));
        }
        match update {
            TargetUpdate::Guards(guards) => target.guards = guards,
            TargetUpdate::Observed(observed) => target.observed = Some(observed),
        }
        target.resource_version = version;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Create(String),
    Update(String),
    Delete(String),
    List,
}

/// Stateful fake backend that records calls and can inject failures.
pub struct FakeGateway<S> {
    resources: Mutex<BTreeMap<String, S>>,
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<VecDeque<BackendError>>,
    delay: Mutex<Duration>,
}

impl<S: DesiredSpec> FakeGateway<S> {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the resource exist without recording a call
    pub fn seed(&self, spec: S) {
        let identity = spec.identity().to_string();
        self.resources.lock().unwrap().insert(identity, spec);
    }

    /// Drop the resource behind the reconciler's back
    pub fn forget(&self, identity: &str) {
        self.resources.lock().unwrap().remove(identity);
    }

    pub fn exists(&self, identity: &str) -> bool {
        self.resources.lock().unwrap().contains_key(identity)
    }

    pub fn fail_next(&self, err: BackendError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    async fn enter(&self, call: BackendCall) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: DesiredSpec> BackendGateway<S> for FakeGateway<S> {
    async fn create(&self, spec: &S) -> Result<(), BackendError> {
        let identity = spec.identity().to_string();
        self.enter(BackendCall::Create(identity.clone())).await?;
        let mut resources = self.resources.lock().unwrap();
        if resources.contains_key(&identity) {
            return Err(BackendError::AlreadyExists(identity));
        }
        resources.insert(identity, spec.clone());
        Ok(())
    }

    async fn update(&self, spec: &S) -> Result<(), BackendError> {
        let identity = spec.identity().to_string();
        self.enter(BackendCall::Update(identity.clone())).await?;
        let mut resources = self.resources.lock().unwrap();
        match resources.get_mut(&identity) {
            Some(existing) => {
                *existing = spec.clone();
                Ok(())
            }
            None => Err(BackendError::NotFound(identity)),
        }
    }

    async fn delete(&self, identity: &str) -> Result<(), BackendError> {
        self.enter(BackendCall::Delete(identity.to_string())).await?;
        match self.resources.lock().unwrap().remove(identity) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound(identity.to_string())),
        }
    }

    async fn list(&self) -> Result<BackendSnapshot, BackendError> {
        self.enter(BackendCall::List).await?;
        Ok(BackendSnapshot {
            identities: self.resources.lock().unwrap().keys().cloned().collect(),
        })
    }
}

/// Hands out the same fake gateway for every connection and counts connects.
pub struct FakeConnector<S> {
    gateway: Arc<FakeGateway<S>>,
    connections: AtomicUsize,
}

impl<S: DesiredSpec> FakeConnector<S> {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl<S: DesiredSpec> Connector<S> for FakeConnector<S> {
    fn connect(
        &self,
        _connection: &Connection,
    ) -> Result<Arc<dyn BackendGateway<S>>, BackendError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(self.gateway.clone())
    }
}

/// Connection resolver returning a fixed connection, or failing when there is none.
pub struct StaticConnection(pub Option<Connection>);

#[async_trait]
impl ConnectionResolver for StaticConnection {
    async fn resolve(&self) -> Result<Connection, BackendError> {
        self.0
            .clone()
            .ok_or_else(|| BackendError::Transient("connection config map not found".to_string()))
    }
}

/// Event sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Subject, Event)>>,
    observations: Mutex<Vec<(&'static str, CallOutcome)>>,
}

impl RecordingSink {
    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn last(&self) -> Option<Event> {
        self.all().pop()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.all().into_iter().map(|e| e.reason).collect()
    }

    pub fn observations(&self) -> Vec<(&'static str, CallOutcome)> {
        self.observations.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, subject: &Subject, event: Event) {
        self.events.lock().unwrap().push((subject.clone(), event));
    }

    fn observe(
        &self,
        _kind: &'static str,
        action: &'static str,
        outcome: CallOutcome,
        _elapsed: Duration,
    ) {
        self.observations.lock().unwrap().push((action, outcome));
    }
}

/// A reconciler for secret engines wired to in-memory fakes.
pub struct Harness {
    pub store: Arc<MemoryStore<SecretEngineSpec>>,
    pub gateway: Arc<FakeGateway<SecretEngineSpec>>,
    pub connector: Arc<FakeConnector<SecretEngineSpec>>,
    pub events: Arc<RecordingSink>,
    pub reconciler: Reconciler<SecretEngineSpec>,
}

impl Harness {
    pub fn new(guard_token: &str) -> Self {
        Self::build(guard_token, true, Duration::from_secs(5))
    }

    pub fn without_connection(guard_token: &str) -> Self {
        Self::build(guard_token, false, Duration::from_secs(5))
    }

    pub fn with_timeout(guard_token: &str, timeout: Duration) -> Self {
        Self::build(guard_token, true, timeout)
    }

    fn build(guard_token: &str, connected: bool, timeout: Duration) -> Self {
        let store: Arc<MemoryStore<SecretEngineSpec>> = Arc::new(MemoryStore::new());
        let gateway: Arc<FakeGateway<SecretEngineSpec>> = Arc::new(FakeGateway::new());
        let connector = Arc::new(FakeConnector {
            gateway: gateway.clone(),
            connections: AtomicUsize::new(0),
        });
        let events: Arc<RecordingSink> = Arc::new(RecordingSink::default());
        let connection = connected.then(|| Connection {
            address: "http://127.0.0.1:8200".to_string(),
            token: "root".to_string(),
        });

        let reconciler = Reconciler::new(
            store.clone(),
            Arc::new(StaticConnection(connection)),
            connector.clone(),
            events.clone(),
            guard_token,
            timeout,
        );

        Self {
            store,
            gateway,
            connector,
            events,
            reconciler,
        }
    }
}
