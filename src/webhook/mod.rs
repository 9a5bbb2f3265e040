// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Validating admission webhook for ExternalSecretsConfig

pub mod gate;

pub use gate::{AdmissionError, UpdateAdmissionGate};

use crate::config::Config;
use crate::types::ExternalSecretsConfig;
use anyhow::Context;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use kube::{
    api::DynamicObject,
    core::{
        admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
        Status,
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub const VALIDATE_PATH: &str = "/validate-operator-openshift-io-v1alpha1-externalsecretsconfig";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub gate: UpdateAdmissionGate,
}

/// Create the webhook router
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(VALIDATE_PATH, post(validate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve the webhook over TLS until the server fails
pub async fn serve(config: &Config, state: Arc<WebhookState>) -> anyhow::Result<()> {
    let tls = RustlsConfig::from_pem_file(config.webhook_cert_path(), config.webhook_key_path())
        .await
        .with_context(|| {
            format!(
                "Failed to load webhook certificate from {}",
                config.webhook_cert_dir.display()
            )
        })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    info!("Starting admission webhook on {}", addr);

    axum_server::bind_rustls(addr, tls)
        .serve(webhook_router(state).into_make_service())
        .await
        .context("Admission webhook server failed")
}

async fn validate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<ExternalSecretsConfig>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<ExternalSecretsConfig> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to parse admission request: {}", e);
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(review_request(&state.gate, &req).await.into_review())
}

/// Decide on one admission request. Only updates are inspected.
#[instrument(skip(gate, req), fields(uid = %req.uid, operation = ?req.operation))]
pub async fn review_request(
    gate: &UpdateAdmissionGate,
    req: &AdmissionRequest<ExternalSecretsConfig>,
) -> AdmissionResponse {
    if !matches!(req.operation, Operation::Update) {
        debug!("Allowing non-update admission request");
        return AdmissionResponse::from(req);
    }

    let (Some(old), Some(new)) = (req.old_object.as_ref(), req.object.as_ref()) else {
        return reject(req, 400, "BadRequest", "update request is missing the old or new object");
    };

    match gate.validate_update(old, new).await {
        Ok(warnings) => {
            let mut response = AdmissionResponse::from(req);
            if !warnings.is_empty() {
                response.warnings = Some(warnings);
            }
            response
        }
        Err(e) => reject(req, 403, "Forbidden", &e.to_string()),
    }
}

/// Deny `req`, carrying an HTTP code in the review result
fn reject(
    req: &AdmissionRequest<ExternalSecretsConfig>,
    code: u16,
    reason: &str,
    message: &str,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(req).deny(message);
    response.result = Status::failure(message, reason).with_code(code);
    response
}
