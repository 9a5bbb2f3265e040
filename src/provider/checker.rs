// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Answers whether any store still references the guarded provider

use crate::constants::provider::MAX_LISTED_RESOURCES;
use crate::error::{OperatorError, Result};
use crate::provider::lookup::LookupChain;
use crate::types::StoreKind;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of a provider usage check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderUsage {
    pub in_use: bool,
    /// Formatted list of referencing resources, empty when not in use
    pub details: String,
}

impl ProviderUsage {
    pub fn from_resources(resources: &[String]) -> Self {
        Self {
            in_use: !resources.is_empty(),
            details: format_resource_list(resources),
        }
    }
}

/// Anything able to answer whether the provider is still referenced
#[async_trait]
pub trait ProviderUsageCheck: Send + Sync {
    async fn check(&self) -> Result<ProviderUsage>;
}

/// Cache-synced predicate shared with the tasks that populate the index
#[derive(Debug, Clone, Default)]
pub struct SyncFlag(Arc<AtomicBool>);

impl SyncFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_synced(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn has_synced(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ProviderUsageChecker {
    provider_key: String,
    lookups: LookupChain,
    synced: Option<SyncFlag>,
}

impl ProviderUsageChecker {
    pub fn new(provider_key: impl Into<String>, lookups: LookupChain) -> Self {
        Self {
            provider_key: provider_key.into(),
            lookups,
            synced: None,
        }
    }

    /// Refuse to answer until `synced` reports the cache as warm
    pub fn with_sync_flag(mut self, synced: SyncFlag) -> Self {
        self.synced = Some(synced);
        self
    }
}

#[async_trait]
impl ProviderUsageCheck for ProviderUsageChecker {
    #[instrument(skip(self), fields(provider = %self.provider_key))]
    async fn check(&self) -> Result<ProviderUsage> {
        if self.synced.as_ref().is_some_and(|s| !s.has_synced()) {
            return Err(OperatorError::CacheNotSynced);
        }

        let mut resources = Vec::new();
        for kind in StoreKind::ALL {
            let found = self
                .lookups
                .find(kind, &self.provider_key)
                .await
                .map_err(|e| OperatorError::ProviderLookup {
                    kind: kind.kind().to_string(),
                    reason: e.to_string(),
                })?;
            resources.extend(found);
        }

        if !resources.is_empty() {
            info!(
                "Provider {} is referenced by {} resources",
                self.provider_key,
                resources.len()
            );
        }

        Ok(ProviderUsage::from_resources(&resources))
    }
}

/// Join the first few resources with ", " and summarise the rest
pub fn format_resource_list(resources: &[String]) -> String {
    if resources.len() <= MAX_LISTED_RESOURCES {
        return resources.join(", ");
    }

    format!(
        "{}, and {} more",
        resources[..MAX_LISTED_RESOURCES].join(", "),
        resources.len() - MAX_LISTED_RESOURCES
    )
}
