// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The managed system, reached through a connection resolved on every attempt.

pub mod vault;

pub use vault::{VaultClient, VaultConnector};

use crate::error::BackendError;
use crate::reconcile::DesiredSpec;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Create/update/delete/list against the backend for one kind of resource.
///
/// Every operation is safe to retry. `create` on an existing resource reports
/// [`BackendError::AlreadyExists`]; `delete` and `update` on a missing one report
/// [`BackendError::NotFound`]. The reconciler decides what those mean.
#[async_trait]
pub trait BackendGateway<S: DesiredSpec>: Send + Sync {
    async fn create(&self, spec: &S) -> Result<(), BackendError>;

    async fn update(&self, spec: &S) -> Result<(), BackendError>;

    async fn delete(&self, identity: &str) -> Result<(), BackendError>;

    async fn list(&self) -> Result<BackendSnapshot, BackendError>;
}

/// Identities present in the backend at the time of a `list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub identities: BTreeSet<String>,
}

impl BackendSnapshot {
    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }
}

/// Address and credential for the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub token: String,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of the current connection parameters. Never cached, so rotated
/// credentials apply on the next attempt.
#[async_trait]
pub trait ConnectionResolver: Send + Sync {
    async fn resolve(&self) -> Result<Connection, BackendError>;
}

/// Builds a gateway for a freshly resolved connection.
pub trait Connector<S: DesiredSpec>: Send + Sync {
    fn connect(
        &self,
        connection: &Connection,
    ) -> Result<Arc<dyn BackendGateway<S>>, BackendError>;
}
