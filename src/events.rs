// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Side channel for human-visible events and backend latency. Purely observational.

use crate::reconcile::Subject;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub reason: String,
    pub message: String,
}

impl Event {
    pub fn normal(reason: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Normal,
            reason: reason.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(reason: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            reason: reason.to_string(),
            message: message.into(),
        }
    }
}

/// Result label of one backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure => "failure",
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish an event against an object. Failures are logged, never returned.
    async fn publish(&self, subject: &Subject, event: Event);

    /// Record how long one backend call took
    fn observe(
        &self,
        kind: &'static str,
        action: &'static str,
        outcome: CallOutcome,
        elapsed: Duration,
    );
}
