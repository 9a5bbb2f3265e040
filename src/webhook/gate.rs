// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Blocks disabling the provider while stores still reference it

use crate::constants::provider;
use crate::error::OperatorError;
use crate::provider::ProviderUsageCheck;
use crate::types::ExternalSecretsConfig;
use kube::ResourceExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("cannot disable provider {provider}: still referenced by {details}")]
    ProviderInUse { provider: String, details: String },

    #[error("cannot disable provider {provider}: unable to verify it is unused: {source}")]
    UsageUnknown {
        provider: String,
        #[source]
        source: OperatorError,
    },
}

pub struct UpdateAdmissionGate {
    checker: Arc<dyn ProviderUsageCheck>,
}

impl UpdateAdmissionGate {
    pub fn new(checker: Arc<dyn ProviderUsageCheck>) -> Self {
        Self { checker }
    }

    /// Enabled before, and disabled or unset after
    pub fn is_disabling_provider(old: &ExternalSecretsConfig, new: &ExternalSecretsConfig) -> bool {
        old.provider_enabled() && !new.provider_enabled()
    }

    /// Validate an update of the config, returning admission warnings on success
    #[instrument(skip(self, old, new), fields(config = %new.name_any()))]
    pub async fn validate_update(
        &self,
        old: &ExternalSecretsConfig,
        new: &ExternalSecretsConfig,
    ) -> Result<Vec<String>, AdmissionError> {
        if !Self::is_disabling_provider(old, new) {
            debug!("Provider mode not being disabled, allowing update");
            return Ok(Vec::new());
        }

        let usage = self.checker.check().await.map_err(|source| {
            warn!("Failed to verify provider usage, rejecting update: {}", source);
            AdmissionError::UsageUnknown {
                provider: provider::KEY.to_string(),
                source,
            }
        })?;

        if usage.in_use {
            info!("Rejecting provider disable, still in use by {}", usage.details);
            return Err(AdmissionError::ProviderInUse {
                provider: provider::KEY.to_string(),
                details: usage.details,
            });
        }

        info!("Provider {} is unused, allowing disable", provider::KEY);
        Ok(Vec::new())
    }
}
