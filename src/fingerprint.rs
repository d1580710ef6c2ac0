// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Content hashing of desired state, used as the only drift signal.

use crate::error::FingerprintError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of the canonical JSON encoding of a spec, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Fingerprint {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Fingerprint any serializable value.
///
/// Struct fields serialize in declaration order and callers use `BTreeMap` for maps,
/// so equal values always produce equal fingerprints.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<Fingerprint, FingerprintError> {
    let canonical = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&canonical);
    Ok(Fingerprint(format!("{:x}", digest)))
}
