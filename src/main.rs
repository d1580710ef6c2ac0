// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mountkeeper::backend::VaultConnector;
use mountkeeper::config::Config;
use mountkeeper::kubernetes::wait_for_crds;
use mountkeeper::metrics;
use mountkeeper::reconcilers::{PolicyReconciler, SecretEngineReconciler, SysAuthReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting mountkeeper operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: connection={}/{}, backend_timeout={:?}",
        config.connection_namespace, config.connection_name, config.backend_timeout
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for mountkeeper CRDs to become available...");
    wait_for_crds(&client).await?;

    let secret_engines =
        SecretEngineReconciler::new(client.clone(), &config, Arc::new(VaultConnector));
    let policies = PolicyReconciler::new(client.clone(), &config, Arc::new(VaultConnector));
    let auth_methods = SysAuthReconciler::new(client, &config, Arc::new(VaultConnector));

    info!("Starting reconcilers...");

    tokio::try_join!(
        metrics::serve(config.metrics_addr),
        secret_engines.run(),
        policies.run(),
        auth_methods.run()
    )?;

    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
