// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes adapters: CRD discovery, the custom-resource store, the connection
//! ConfigMap and event publishing.

pub mod connection;
pub mod crd;
pub mod events;
pub mod store;

pub use connection::ConfigMapConnection;
pub use crd::wait_for_crds;
pub use events::KubeEventSink;
pub use store::{target_from, KubeStore};
