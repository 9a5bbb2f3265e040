// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provider usage detection across SecretStores and ClusterSecretStores.

pub mod checker;
pub mod informer;
pub mod lookup;

pub use checker::{
    format_resource_list, ProviderUsage, ProviderUsageCheck, ProviderUsageChecker, SyncFlag,
};
pub use informer::start_store_informers;
pub use lookup::{IndexedLookup, ListLookup, LookupChain, LookupError, StoreLookup};
