// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod kubernetes;
pub mod metrics;
pub mod reconcile;
pub mod reconcilers;
pub mod types;

#[cfg(test)]
mod test_utils;
