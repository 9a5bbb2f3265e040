// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Strategies for finding stores that configure a given provider.
//!
//! Strategies are tried in order by [`LookupChain`]: the first success wins
//! and the last error is reported when every strategy fails.

use crate::error::is_not_found;
use crate::types::secret_store::{provider_types, references_provider};
use crate::types::StoreKind;
use async_trait::async_trait;
use kube::{
    api::{DynamicObject, ListParams},
    runtime::reflector::Store,
    Api, Client,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LookupError {
    /// The kind is not served by the API server, so nothing can reference the provider
    #[error("{0} is not installed")]
    KindNotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

/// A way of finding the stores of one kind that configure a provider.
/// Matches are returned as human readable identifiers.
#[async_trait]
pub trait StoreLookup: Send + Sync {
    fn name(&self) -> &'static str;

    async fn find(&self, kind: StoreKind, provider_key: &str) -> Result<Vec<String>, LookupError>;
}

/// Fast path: reflector stores filtered through the provider-type index
#[derive(Default, Clone)]
pub struct IndexedLookup {
    stores: HashMap<StoreKind, Store<DynamicObject>>,
}

impl IndexedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, kind: StoreKind, store: Store<DynamicObject>) -> Self {
        self.stores.insert(kind, store);
        self
    }
}

#[async_trait]
impl StoreLookup for IndexedLookup {
    fn name(&self) -> &'static str {
        "index"
    }

    async fn find(&self, kind: StoreKind, provider_key: &str) -> Result<Vec<String>, LookupError> {
        let store = self.stores.get(&kind).ok_or_else(|| {
            LookupError::Unavailable(format!("no provider index for {}", kind.kind()))
        })?;

        Ok(store
            .state()
            .iter()
            .filter(|obj| provider_types(obj).iter().any(|t| t == provider_key))
            .map(|obj| kind.describe(obj))
            .collect())
    }
}

/// Slow path: list every object of the kind and inspect `spec.provider`
pub struct ListLookup {
    client: Client,
}

impl ListLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StoreLookup for ListLookup {
    fn name(&self) -> &'static str {
        "list"
    }

    async fn find(&self, kind: StoreKind, provider_key: &str) -> Result<Vec<String>, LookupError> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &kind.api_resource());

        let list = match api.list(&ListParams::default()).await {
            Ok(list) => list,
            Err(e) if is_not_found(&e) => return Err(LookupError::KindNotFound(kind.kind().to_string())),
            Err(e) => return Err(e.into()),
        };

        Ok(list
            .items
            .iter()
            .filter(|obj| references_provider(obj, provider_key))
            .map(|obj| kind.describe(obj))
            .collect())
    }
}

/// Ordered list of lookup strategies
pub struct LookupChain {
    strategies: Vec<Box<dyn StoreLookup>>,
}

impl LookupChain {
    pub fn new(strategies: Vec<Box<dyn StoreLookup>>) -> Self {
        Self { strategies }
    }

    /// Run the strategies in order. A missing kind counts as success with
    /// no matches; any other failure moves on to the next strategy.
    pub async fn find(&self, kind: StoreKind, provider_key: &str) -> Result<Vec<String>, LookupError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.find(kind, provider_key).await {
                Ok(found) => {
                    debug!(
                        strategy = strategy.name(),
                        kind = kind.kind(),
                        matches = found.len(),
                        "Provider lookup succeeded"
                    );
                    return Ok(found);
                }
                Err(LookupError::KindNotFound(k)) => {
                    debug!(strategy = strategy.name(), "{} is not installed, no matches", k);
                    return Ok(Vec::new());
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        kind = kind.kind(),
                        error = %e,
                        "Provider lookup failed, trying next strategy"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| LookupError::Unavailable("no lookup strategies configured".to_string())))
    }
}
