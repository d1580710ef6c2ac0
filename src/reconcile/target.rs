// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::ObservedState;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a desired-state object in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    pub namespace: Option<String>,
    pub name: String,
}

impl TargetId {
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: &str, name: &str) -> Self {
        Self::new(Some(namespace.to_string()), name)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// What events are attached to: the identity plus the incarnation of the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: TargetId,
    pub uid: Option<String>,
}

/// Guard tokens (finalizers) present on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardSet(BTreeSet<String>);

impl GuardSet {
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Returns false if the token was already present
    pub fn add(&mut self, token: &str) -> bool {
        self.0.insert(token.to_string())
    }

    /// Returns false if the token was not present
    pub fn remove(&mut self, token: &str) -> bool {
        self.0.remove(token)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<T: Into<String>> FromIterator<T> for GuardSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        GuardSet(iter.into_iter().map(Into::into).collect())
    }
}

/// One desired-state object with everything the state machine decides on.
#[derive(Debug, Clone)]
pub struct ReconcileTarget<S> {
    pub subject: Subject,
    pub spec: S,
    pub observed: Option<ObservedState>,
    /// Set by the store when the owner asked for deletion
    pub deletion_requested_at: Option<DateTime<Utc>>,
    pub guards: GuardSet,
    /// Precondition for writes
    pub resource_version: Option<String>,
    pub generation: Option<i64>,
}

impl<S> ReconcileTarget<S> {
    pub fn id(&self) -> &TargetId {
        &self.subject.id
    }

    pub fn is_being_deleted(&self) -> bool {
        self.deletion_requested_at.is_some()
    }
}

/// A conditional write back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUpdate {
    /// Replace the complete guard-token set
    Guards(GuardSet),
    /// Replace the observed state
    Observed(ObservedState),
}
