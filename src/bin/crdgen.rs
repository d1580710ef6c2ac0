// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::CustomResourceExt;
use mountkeeper::types::{Policy, SecretEngine, SysAuth};

/// Print the CRDs as a multi-document YAML stream for `kubectl apply -f -`
fn main() -> Result<()> {
    print!("{}", serde_yaml::to_string(&SecretEngine::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&Policy::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&SysAuth::crd())?);
    Ok(())
}
