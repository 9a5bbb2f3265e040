// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD annotation reconciler - keeps managed CRDs annotated while the
//! ExternalSecretsConfig asks for it, and reports the outcome in its status.

use crate::constants::{
    conditions::UPDATE_ANNOTATION, labels, CONFIG_NAME, RECONCILE_ALL_SENTINEL,
    TRANSIENT_REQUEUE_SECS,
};
use crate::error::{OperatorError, Result};
use crate::kubernetes::annotations::is_managed;
use crate::kubernetes::{AnnotationSynchronizer, ConditionTracker};
use crate::retry::RetryPolicy;
use crate::types::ExternalSecretsConfig;
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const SUCCESS_MESSAGE: &str = "CRD annotations are up to date";

/// What a single reconcile pass should work on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub name: String,
}

impl ReconcileRequest {
    /// Every managed CRD
    pub fn all() -> Self {
        Self {
            name: RECONCILE_ALL_SENTINEL.to_string(),
        }
    }

    /// One CRD by name
    pub fn crd(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_all(&self) -> bool {
        self.name == RECONCILE_ALL_SENTINEL
    }
}

pub struct CrdAnnotationReconciler {
    client: Client,
    configs: Api<ExternalSecretsConfig>,
    annotations: AnnotationSynchronizer,
    conditions: ConditionTracker,
    error_requeue: Duration,
}

impl CrdAnnotationReconciler {
    pub fn new(client: Client, retry: RetryPolicy, error_requeue: Duration) -> Self {
        Self {
            configs: Api::all(client.clone()),
            annotations: AnnotationSynchronizer::new(client.clone()),
            conditions: ConditionTracker::new(client.clone(), retry),
            client,
            error_requeue,
        }
    }

    /// Watch managed CRDs and the config, dispatching both into [`Self::reconcile`]
    pub async fn run(self) -> anyhow::Result<()> {
        let crds: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let configs: Api<ExternalSecretsConfig> = Api::all(self.client.clone());
        let context = Arc::new(self);

        let crd_controller = Controller::new(
            crds,
            WatcherConfig::default().labels(labels::MANAGED_SELECTOR),
        )
        .run(reconcile_crd, error_policy, context.clone())
        .for_each(|res| async move {
            match res {
                Ok(o) => debug!("Reconciled CRD: {:?}", o),
                Err(e) => warn!("CRD reconciliation error: {:?}", e),
            }
        });

        let config_controller = Controller::new(
            configs,
            WatcherConfig::default().fields(&format!("metadata.name={}", CONFIG_NAME)),
        )
        .run(reconcile_config, error_policy, context)
        .for_each(|res| async move {
            match res {
                Ok(o) => debug!("Reconciled config: {:?}", o),
                Err(e) => warn!("Config reconciliation error: {:?}", e),
            }
        });

        tokio::join!(crd_controller, config_controller);

        Ok(())
    }

    /// One reconcile pass. The status condition always reflects this pass,
    /// whatever its outcome.
    #[instrument(skip(self), fields(request = %request.name))]
    pub async fn reconcile(&self, request: &ReconcileRequest) -> Result<()> {
        let config = match self.configs.get_opt(CONFIG_NAME).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!("ExternalSecretsConfig {} not found, nothing to do", CONFIG_NAME);
                return Ok(());
            }
            Err(source) => {
                return Err(OperatorError::ConfigFetch {
                    key: CONFIG_NAME.to_string(),
                    source,
                })
            }
        };

        if !config.injects_annotations() {
            debug!("Annotation injection disabled, skipping");
            return Ok(());
        }

        let outcome = if request.is_all() {
            self.annotations.sync_all().await.map(|_| ())
        } else {
            self.sync_named(&request.name).await
        };

        if let Err(e) = &outcome {
            error!("Failed to inject CRD annotations: {}", e);
        }

        let status = self
            .conditions
            .record(&config, UPDATE_ANNOTATION, &outcome, SUCCESS_MESSAGE)
            .await
            .map(|_| ());

        OperatorError::aggregate(outcome, status)
    }

    async fn sync_named(&self, name: &str) -> Result<()> {
        match self.annotations.get(name).await? {
            None => {
                debug!("CRD {} no longer exists", name);
                Ok(())
            }
            Some(crd) if !is_managed(&crd) => {
                debug!("CRD {} is not managed, skipping", name);
                Ok(())
            }
            Some(crd) => self.annotations.sync_one(&crd).await.map(|_| ()),
        }
    }
}

async fn reconcile_crd(
    crd: Arc<CustomResourceDefinition>,
    ctx: Arc<CrdAnnotationReconciler>,
) -> Result<Action> {
    ctx.reconcile(&ReconcileRequest::crd(crd.name_any())).await?;
    Ok(Action::await_change())
}

async fn reconcile_config(
    config: Arc<ExternalSecretsConfig>,
    ctx: Arc<CrdAnnotationReconciler>,
) -> Result<Action> {
    info!("ExternalSecretsConfig {} changed, checking all managed CRDs", config.name_any());
    ctx.reconcile(&ReconcileRequest::all()).await?;
    Ok(Action::await_change())
}

fn error_policy<K>(_obj: Arc<K>, error: &OperatorError, ctx: Arc<CrdAnnotationReconciler>) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(requeue_delay(error, ctx.error_requeue))
}

/// Transient errors come back sooner, never later than `error_requeue`
fn requeue_delay(error: &OperatorError, error_requeue: Duration) -> Duration {
    if error.is_transient() {
        Duration::from_secs(TRANSIENT_REQUEUE_SECS).min(error_requeue)
    } else {
        error_requeue
    }
}
