// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::{core::GroupVersionKind, Client, CustomResourceExt};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use external_secrets_operator::config::Config;
use external_secrets_operator::constants::provider;
use external_secrets_operator::kubernetes::wait_for_crd;
use external_secrets_operator::provider::{
    start_store_informers, ListLookup, LookupChain, ProviderUsageChecker, StoreLookup,
};
use external_secrets_operator::reconcilers::CrdAnnotationReconciler;
use external_secrets_operator::retry::RetryPolicy;
use external_secrets_operator::types::ExternalSecretsConfig;
use external_secrets_operator::webhook::{self, UpdateAdmissionGate, WebhookState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("external_secrets_operator=info,warn")),
        )
        .init();

    info!("Starting External Secrets operator");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: webhook_enabled={}, webhook_port={}",
        config.webhook_enabled, config.webhook_port
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for ExternalSecretsConfig CRD to become available...");
    let ar = ExternalSecretsConfig::api_resource();
    wait_for_crd(&client, &GroupVersionKind::gvk(&ar.group, &ar.version, &ar.kind)).await?;

    let reconciler =
        CrdAnnotationReconciler::new(client.clone(), RetryPolicy::default(), config.error_requeue);

    info!("Starting reconcilers...");

    if config.webhook_enabled {
        let (indexed, synced) = start_store_informers(&client).await;
        let strategies: Vec<Box<dyn StoreLookup>> =
            vec![Box::new(indexed), Box::new(ListLookup::new(client.clone()))];
        let lookups = LookupChain::new(strategies);
        let checker = ProviderUsageChecker::new(provider::KEY, lookups).with_sync_flag(synced);
        let state = Arc::new(WebhookState {
            gate: UpdateAdmissionGate::new(Arc::new(checker)),
        });

        tokio::try_join!(reconciler.run(), webhook::serve(&config, state))?;
    } else {
        info!("Admission webhook disabled");
        reconciler.run().await?;
    }

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
