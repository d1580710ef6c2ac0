// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group served by the mountkeeper CRDs
pub const API_GROUP: &str = "vault.mountkeeper.dev";
/// API version served by the mountkeeper CRDs
pub const API_VERSION: &str = "v1";

/// The operator name used as event reporter and field manager
pub const OPERATOR_NAME: &str = "mountkeeper";

/// Guard tokens (finalizers) owned by mountkeeper
pub mod finalizers {
    pub const SECRET_ENGINE: &str = "secretengine.finalizers.vault.mountkeeper.dev";
    pub const POLICY: &str = "policy.finalizers.vault.mountkeeper.dev";
    pub const SYS_AUTH: &str = "sysauth.finalizers.vault.mountkeeper.dev";
}

/// Keys of the connection ConfigMap
pub mod connection {
    pub const ADDRESS_KEY: &str = "address";
    pub const TOKEN_KEY: &str = "token";
    pub const DEFAULT_NAMESPACE: &str = "vault-controller-system";
    pub const DEFAULT_NAME: &str = "config";
}

/// Event reasons published against reconciled objects
pub mod reasons {
    pub const CREATED: &str = "Created";
    pub const UPDATED: &str = "Updated";
    pub const RELOCATED: &str = "Relocated";
    pub const DELETED: &str = "Deleted";
    pub const GUARD_ADDED: &str = "FinalizerAdded";
    pub const INVALID_SPEC: &str = "InvalidSpec";
    pub const SYNC_FAILED: &str = "SyncFailed";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
