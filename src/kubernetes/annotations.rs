// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keeps the CA injection annotation on managed CRDs

use crate::constants::{annotations, labels};
use crate::error::{OperatorError, Result};
use crate::kubernetes::patch_params;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{ListParams, Patch},
    Api, Client, ResourceExt,
};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Check if a CRD carries the managed-resource label
pub fn is_managed(crd: &CustomResourceDefinition) -> bool {
    crd.labels()
        .get(labels::MANAGED_KEY)
        .is_some_and(|v| v == labels::MANAGED_VALUE)
}

/// Check if a CRD already carries the expected injection annotation
pub fn has_expected_annotation(crd: &CustomResourceDefinition) -> bool {
    crd.annotations()
        .get(annotations::INJECT_CA_FROM)
        .is_some_and(|v| v == annotations::INJECT_CA_FROM_VALUE)
}

pub struct AnnotationSynchronizer {
    crds: Api<CustomResourceDefinition>,
}

impl AnnotationSynchronizer {
    pub fn new(client: Client) -> Self {
        Self {
            crds: Api::all(client),
        }
    }

    /// Fetch a CRD by name, `None` when it does not exist
    pub async fn get(&self, name: &str) -> Result<Option<CustomResourceDefinition>> {
        self.crds
            .get_opt(name)
            .await
            .map_err(|source| OperatorError::CrdFetch {
                name: name.to_string(),
                source,
            })
    }

    /// Set the annotation on one CRD if it is missing or wrong.
    /// Returns whether a patch was sent.
    #[instrument(skip(self, crd), fields(crd = %crd.name_any()))]
    pub async fn sync_one(&self, crd: &CustomResourceDefinition) -> Result<bool> {
        let name = crd.name_any();

        if has_expected_annotation(crd) {
            debug!("CRD {} already annotated", name);
            return Ok(false);
        }

        let key = annotations::INJECT_CA_FROM;
        let patch = json!({
            "metadata": {
                "annotations": { key: annotations::INJECT_CA_FROM_VALUE }
            }
        });

        self.crds
            .patch(&name, &patch_params(), &Patch::Merge(&patch))
            .await
            .map_err(|source| OperatorError::CrdPatch {
                name: name.clone(),
                source,
            })?;

        info!("Annotated CRD {} with {}", name, annotations::INJECT_CA_FROM);
        Ok(true)
    }

    /// Annotate every managed CRD, one at a time, stopping at the first failure.
    /// Returns the number of CRDs patched.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<usize> {
        let lp = ListParams::default().labels(labels::MANAGED_SELECTOR);
        let crds = self
            .crds
            .list(&lp)
            .await
            .map_err(|source| OperatorError::CrdList {
                selector: labels::MANAGED_SELECTOR.to_string(),
                source,
            })?;

        if crds.items.is_empty() {
            info!("No managed CRDs found with selector {}", labels::MANAGED_SELECTOR);
            return Ok(0);
        }

        let mut patched = 0;
        for crd in &crds.items {
            if self.sync_one(crd).await? {
                patched += 1;
            }
        }

        info!(
            "Checked {} managed CRDs, patched {}",
            crds.items.len(),
            patched
        );
        Ok(patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        crd_json, crd_path, crd_value, list_json, status_json, MockService, CRD_PATH,
    };
    use serde_json::{json, Value};

    const STORES: &str = "secretstores.external-secrets.io";
    const CLUSTER_STORES: &str = "clustersecretstores.external-secrets.io";
    const PUSH_SECRETS: &str = "pushsecrets.external-secrets.io";

    fn managed_labels() -> Value {
        json!({"external-secrets.io/component": "controller"})
    }

    fn annotated() -> Value {
        json!({"cert-manager.io/inject-ca-from": "external-secrets/external-secrets-webhook"})
    }

    fn make_crd(name: &str, labels: Value, annotations: Value) -> CustomResourceDefinition {
        serde_json::from_value(crd_value(name, labels, annotations)).unwrap()
    }

    fn crd_list(items: Vec<Value>) -> String {
        list_json("apiextensions.k8s.io/v1", "CustomResourceDefinitionList", items)
    }

    #[test]
    fn test_is_managed() {
        assert!(is_managed(&make_crd(STORES, managed_labels(), json!({}))));
        assert!(!is_managed(&make_crd(
            STORES,
            json!({"external-secrets.io/component": "webhook"}),
            json!({})
        )));
        assert!(!is_managed(&make_crd(STORES, json!({}), json!({}))));
    }

    #[test]
    fn test_has_expected_annotation() {
        assert!(has_expected_annotation(&make_crd(STORES, json!({}), annotated())));
        assert!(!has_expected_annotation(&make_crd(
            STORES,
            json!({}),
            json!({"cert-manager.io/inject-ca-from": "other/cert"})
        )));
        assert!(!has_expected_annotation(&make_crd(STORES, json!({}), json!({}))));
    }

    #[tokio::test]
    async fn test_sync_one_skips_annotated_crd() {
        let mock = MockService::new();
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        let patched = sync
            .sync_one(&make_crd(STORES, managed_labels(), annotated()))
            .await
            .unwrap();

        assert!(!patched);
        assert_eq!(mock.count("PATCH"), 0);
    }

    #[tokio::test]
    async fn test_sync_one_patches_missing_annotation() {
        let mock = MockService::new().on_patch(
            &crd_path(STORES),
            200,
            &crd_json(STORES, managed_labels(), annotated()),
        );
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        let patched = sync
            .sync_one(&make_crd(STORES, managed_labels(), json!({})))
            .await
            .unwrap();

        assert!(patched);
        let requests = mock.requests_to("PATCH", &crd_path(STORES));
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].json(),
            json!({"metadata": {"annotations": {
                "cert-manager.io/inject-ca-from": "external-secrets/external-secrets-webhook"
            }}})
        );
    }

    #[tokio::test]
    async fn test_sync_one_patches_wrong_value() {
        let mock = MockService::new().on_patch(
            &crd_path(STORES),
            200,
            &crd_json(STORES, managed_labels(), annotated()),
        );
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        let crd = make_crd(
            STORES,
            managed_labels(),
            json!({"cert-manager.io/inject-ca-from": "stale/cert"}),
        );
        assert!(sync.sync_one(&crd).await.unwrap());
        assert_eq!(mock.count("PATCH"), 1);
    }

    #[tokio::test]
    async fn test_sync_one_wraps_patch_error_with_name() {
        let mock = MockService::new().on_patch(
            &crd_path(STORES),
            403,
            &status_json(403, "Forbidden", "cannot patch"),
        );
        let sync = AnnotationSynchronizer::new(mock.into_client());

        let err = sync
            .sync_one(&make_crd(STORES, managed_labels(), json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, OperatorError::CrdPatch { ref name, .. } if name == STORES));
        assert!(err.to_string().contains("cannot patch"));
    }

    #[tokio::test]
    async fn test_sync_all_with_empty_list() {
        let mock = MockService::new().on_get(CRD_PATH, 200, &crd_list(vec![]));
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        assert_eq!(sync.sync_all().await.unwrap(), 0);
        assert_eq!(mock.count("PATCH"), 0);
    }

    #[tokio::test]
    async fn test_sync_all_uses_label_selector() {
        let mock = MockService::new().on_get(CRD_PATH, 200, &crd_list(vec![]));
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        sync.sync_all().await.unwrap();

        let query = mock.requests_to("GET", CRD_PATH)[0].query.clone().unwrap();
        assert!(query.contains("labelSelector=external-secrets.io%2Fcomponent%3Dcontroller"));
    }

    #[tokio::test]
    async fn test_sync_all_patches_only_non_conforming() {
        let mock = MockService::new()
            .on_get(
                CRD_PATH,
                200,
                &crd_list(vec![
                    crd_value(STORES, managed_labels(), json!({})),
                    crd_value(CLUSTER_STORES, managed_labels(), annotated()),
                    crd_value(PUSH_SECRETS, managed_labels(), json!({"other": "x"})),
                ]),
            )
            .on_patch(&crd_path(STORES), 200, &crd_json(STORES, managed_labels(), annotated()))
            .on_patch(
                &crd_path(PUSH_SECRETS),
                200,
                &crd_json(PUSH_SECRETS, managed_labels(), annotated()),
            );
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        assert_eq!(sync.sync_all().await.unwrap(), 2);
        assert_eq!(mock.requests_to("PATCH", &crd_path(STORES)).len(), 1);
        assert_eq!(mock.requests_to("PATCH", &crd_path(PUSH_SECRETS)).len(), 1);
        assert!(mock.requests_to("PATCH", &crd_path(CLUSTER_STORES)).is_empty());
    }

    #[tokio::test]
    async fn test_sync_all_aborts_on_first_failure() {
        let mock = MockService::new()
            .on_get(
                CRD_PATH,
                200,
                &crd_list(vec![
                    crd_value(STORES, managed_labels(), json!({})),
                    crd_value(PUSH_SECRETS, managed_labels(), json!({})),
                ]),
            )
            .on_patch(
                &crd_path(STORES),
                500,
                &status_json(500, "InternalError", "boom"),
            )
            .on_patch(
                &crd_path(PUSH_SECRETS),
                200,
                &crd_json(PUSH_SECRETS, managed_labels(), annotated()),
            );
        let sync = AnnotationSynchronizer::new(mock.clone().into_client());

        let err = sync.sync_all().await.unwrap_err();

        assert!(err.to_string().contains(STORES));
        assert!(mock.requests_to("PATCH", &crd_path(PUSH_SECRETS)).is_empty());
    }

    #[tokio::test]
    async fn test_sync_all_wraps_list_error() {
        let mock = MockService::new().on_get(
            CRD_PATH,
            403,
            &status_json(403, "Forbidden", "cannot list"),
        );
        let sync = AnnotationSynchronizer::new(mock.into_client());

        let err = sync.sync_all().await.unwrap_err();
        assert!(matches!(err, OperatorError::CrdList { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_crd_returns_none() {
        let mock = MockService::new();
        let sync = AnnotationSynchronizer::new(mock.into_client());

        assert!(sync.get(STORES).await.unwrap().is_none());
    }
}
