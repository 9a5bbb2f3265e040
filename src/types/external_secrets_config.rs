// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Cluster-wide operator configuration. A single object named `cluster` is honoured.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "operator.openshift.io",
    version = "v1alpha1",
    kind = "ExternalSecretsConfig",
    plural = "externalsecretsconfigs"
)]
#[kube(status = "ExternalSecretsConfigStatus")]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretsConfigSpec {
    /// Inject the cert-manager CA annotation on managed CRDs
    #[serde(default)]
    pub inject_annotations: bool,
    /// Whether the bitwarden secrets manager provider is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_mode: Option<ProviderMode>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum ProviderMode {
    Enabled,
    Disabled,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretsConfigStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Same type, status, reason, message and generation. Timestamps are ignored.
    pub fn is_equivalent(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.observed_generation == other.observed_generation
    }
}

impl ExternalSecretsConfig {
    pub fn injects_annotations(&self) -> bool {
        self.spec.inject_annotations
    }

    /// An absent provider mode counts as disabled
    pub fn provider_enabled(&self) -> bool {
        self.spec.provider_mode == Some(ProviderMode::Enabled)
    }

    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// Replace-by-type merge of `condition` into `conditions`.
///
/// Returns false when an equivalent condition is already present, in which
/// case `conditions` is left untouched. The previous transition time is kept
/// when the status did not flip.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) -> bool {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        Some(existing) if existing.is_equivalent(&condition) => false,
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time.clone();
            }
            *existing = condition;
            true
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}
