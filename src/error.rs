// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to fetch ExternalSecretsConfig '{key}': {source}")]
    ConfigFetch {
        key: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to fetch CRD '{name}': {source}")]
    CrdFetch {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to list CRDs with selector '{selector}': {source}")]
    CrdList {
        selector: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to patch annotations on CRD '{name}': {source}")]
    CrdPatch {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to update status of ExternalSecretsConfig '{key}': {source}")]
    StatusUpdate {
        key: String,
        #[source]
        source: kube::Error,
    },

    #[error("Informer cache has not synced yet, retry later")]
    CacheNotSynced,

    #[error("Failed to look up {kind} resources: {reason}")]
    ProviderLookup { kind: String, reason: String },

    #[error("{operation}; additionally failed to record status: {status}")]
    WithStatus {
        operation: Box<OperatorError>,
        status: Box<OperatorError>,
    },
}

impl OperatorError {
    /// Whether this error is an optimistic concurrency conflict (HTTP 409)
    pub fn is_conflict(&self) -> bool {
        match self {
            OperatorError::KubeError(e) | OperatorError::StatusUpdate { source: e, .. } => {
                is_conflict(e)
            }
            _ => false,
        }
    }

    /// Whether a caller should simply retry later
    pub fn is_transient(&self) -> bool {
        matches!(self, OperatorError::CacheNotSynced) || self.is_conflict()
    }

    /// Combine an operation outcome with a status recording outcome,
    /// keeping the operation error in front.
    pub fn aggregate(operation: Result<()>, status: Result<()>) -> Result<()> {
        match (operation, status) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(operation), Err(status)) => Err(OperatorError::WithStatus {
                operation: Box::new(operation),
                status: Box::new(status),
            }),
        }
    }
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 404)
}

pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 409)
}

pub type Result<T> = std::result::Result<T, OperatorError>;
