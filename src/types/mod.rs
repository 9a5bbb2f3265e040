// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types read or written by the operator.

pub mod external_secrets_config;
pub mod secret_store;

pub use external_secrets_config::{
    set_condition, Condition, ExternalSecretsConfig, ExternalSecretsConfigSpec,
    ExternalSecretsConfigStatus, ProviderMode,
};
pub use secret_store::StoreKind;
