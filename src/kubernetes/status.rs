// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status condition bookkeeping on the ExternalSecretsConfig singleton

use crate::constants::conditions::{REASON_COMPLETED, REASON_FAILED};
use crate::error::{is_not_found, OperatorError, Result};
use crate::kubernetes::patch_params;
use crate::retry::{retry_on_conflict, RetryPolicy};
use crate::types::{set_condition, Condition, ExternalSecretsConfig};
use chrono::{SecondsFormat, Utc};
use kube::{api::Patch, Api, Client, ResourceExt};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Records the outcome of an operation as a condition on the config status
pub struct ConditionTracker {
    api: Api<ExternalSecretsConfig>,
    retry: RetryPolicy,
}

impl ConditionTracker {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            api: Api::all(client),
            retry,
        }
    }

    /// Build the condition describing `outcome`
    pub fn desired_condition(
        config: &ExternalSecretsConfig,
        condition_type: &str,
        outcome: &Result<()>,
        success_message: &str,
    ) -> Condition {
        let (status, reason, message) = match outcome {
            Ok(()) => ("True", REASON_COMPLETED, success_message.to_string()),
            Err(e) => ("False", REASON_FAILED, e.to_string()),
        };

        Condition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            message: Some(message),
            observed_generation: config.metadata.generation,
            last_transition_time: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    /// Store the condition for `outcome` unless `config` already carries an
    /// equivalent one. Returns whether a status write happened.
    #[instrument(skip(self, config, outcome), fields(config = %config.name_any()))]
    pub async fn record(
        &self,
        config: &ExternalSecretsConfig,
        condition_type: &str,
        outcome: &Result<()>,
        success_message: &str,
    ) -> Result<bool> {
        let desired = Self::desired_condition(config, condition_type, outcome, success_message);

        let mut conditions = config.conditions().to_vec();
        if !set_condition(&mut conditions, desired.clone()) {
            debug!("Condition {} unchanged, skipping status update", condition_type);
            return Ok(false);
        }

        let name = config.name_any();
        let written = retry_on_conflict(&self.retry, "update config status", || {
            self.write_condition(&name, desired.clone())
        })
        .await?;

        if written {
            info!(
                "Set condition {}={} on ExternalSecretsConfig {}",
                desired.condition_type, desired.status, name
            );
        }
        Ok(written)
    }

    /// One re-fetch and update cycle. The write carries the fetched
    /// resourceVersion so a concurrent writer turns it into a conflict.
    async fn write_condition(&self, name: &str, desired: Condition) -> Result<bool> {
        let latest = match self.api.get(name).await {
            Ok(latest) => latest,
            Err(e) if is_not_found(&e) => {
                debug!("ExternalSecretsConfig {} is gone, nothing to record", name);
                return Ok(false);
            }
            Err(source) => {
                return Err(OperatorError::StatusUpdate {
                    key: name.to_string(),
                    source,
                })
            }
        };

        let mut status = latest.status.clone().unwrap_or_default();
        if !set_condition(&mut status.conditions, desired) {
            debug!("Latest ExternalSecretsConfig {} already carries the condition", name);
            return Ok(false);
        }

        let patch = json!({
            "metadata": { "resourceVersion": latest.resource_version() },
            "status": status,
        });

        self.api
            .patch_status(name, &patch_params(), &Patch::Merge(&patch))
            .await
            .map_err(|source| OperatorError::StatusUpdate {
                key: name.to_string(),
                source,
            })?;

        Ok(true)
    }
}
