// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::reasons;
use thiserror::Error;

/// Outcome of a failed reconcile attempt, as seen by the controller's retry wrapper.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The desired state cannot be synchronized as written. Not retried until the spec changes.
    #[error("Invalid desired state: {0}")]
    Config(String),

    /// The backend, the connection source or the store is unavailable. Retried.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The object changed underneath the attempt. Redriven from fresh reads.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ReconcileError {
    /// Event reason used when the error is surfaced to users
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::Config(_) => reasons::INVALID_SPEC,
            ReconcileError::Transient(_) | ReconcileError::Conflict(_) => reasons::SYNC_FAILED,
        }
    }

    /// Conflicts are expected under concurrent edits and are not reported as failures
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ReconcileError::Conflict(_))
    }
}

/// Errors signalled by a backend gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The backend refused the request as invalid
    #[error("Request rejected by backend: {0}")]
    Rejected(String),

    #[error("Backend unavailable: {0}")]
    Transient(String),
}

/// Errors signalled by the desired-state store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object was modified concurrently: {0}")]
    Conflict(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Spec cannot be fingerprinted: {0}")]
    Unrepresentable(#[from] serde_json::Error),
}

impl From<FingerprintError> for ReconcileError {
    fn from(err: FingerprintError) -> Self {
        ReconcileError::Config(err.to_string())
    }
}

impl From<BackendError> for ReconcileError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(_) => ReconcileError::Config(err.to_string()),
            _ => ReconcileError::Transient(err.to_string()),
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            // A vanished object is redriven too: the next read reports it gone.
            StoreError::Conflict(_) | StoreError::NotFound(_) => {
                ReconcileError::Conflict(err.to_string())
            }
            StoreError::Unavailable(_) => ReconcileError::Transient(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
