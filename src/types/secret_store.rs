// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Store kinds of the external-secrets API that may reference a provider.
//!
//! These are read as `DynamicObject`s since the operator never owns them.

use kube::api::DynamicObject;
use kube::core::{ApiResource, GroupVersionKind};
use kube::ResourceExt;
use serde_json::Value;

pub const GROUP: &str = "external-secrets.io";
pub const VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    SecretStore,
    ClusterSecretStore,
}

impl StoreKind {
    pub const ALL: [StoreKind; 2] = [StoreKind::SecretStore, StoreKind::ClusterSecretStore];

    pub fn kind(&self) -> &'static str {
        match self {
            StoreKind::SecretStore => "SecretStore",
            StoreKind::ClusterSecretStore => "ClusterSecretStore",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            StoreKind::SecretStore => "secretstores",
            StoreKind::ClusterSecretStore => "clustersecretstores",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(self, StoreKind::SecretStore)
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(GROUP, VERSION, self.kind())
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), self.plural())
    }

    /// Human readable identity, e.g. `SecretStore 'team-a/vault'`
    pub fn describe(&self, obj: &DynamicObject) -> String {
        match obj.namespace().filter(|_| self.is_namespaced()) {
            Some(ns) => format!("{} '{}/{}'", self.kind(), ns, obj.name_any()),
            None => format!("{} '{}'", self.kind(), obj.name_any()),
        }
    }
}

/// Walk `path` through nested objects of `value`.
pub fn nested_field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Whether the store configures `provider_key` under `spec.provider`
pub fn references_provider(obj: &DynamicObject, provider_key: &str) -> bool {
    nested_field(&obj.data, &["spec", "provider", provider_key]).is_some()
}

/// Index function: the provider types configured by a store
pub fn provider_types(obj: &DynamicObject) -> Vec<String> {
    nested_field(&obj.data, &["spec", "provider"])
        .and_then(Value::as_object)
        .map(|providers| providers.keys().cloned().collect())
        .unwrap_or_default()
}
