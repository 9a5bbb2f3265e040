// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::core::GroupVersionKind;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for a CRD to become available in the cluster.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crd(client: &Client, gvk: &GroupVersionKind) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match is_kind_served(client, gvk).await {
            Ok(true) => {
                info!("{} CRD ({}/{}) is available", gvk.kind, gvk.group, gvk.version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "{} CRD ({}/{}) not yet available, waiting {} seconds...",
                    gvk.kind, gvk.group, gvk.version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for {} CRD: {}, retrying in {} seconds...",
                    gvk.kind, e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check whether the API server serves `gvk`.
pub async fn is_kind_served(client: &Client, gvk: &GroupVersionKind) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[gvk.group.as_str()])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == gvk.group {
            for (ar, _) in group.versioned_resources(&gvk.version) {
                if ar.kind == gvk.kind {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
