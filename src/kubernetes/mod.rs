// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, CRD annotations, and config status.

pub mod annotations;
pub mod crd;
pub mod status;

pub use annotations::AnnotationSynchronizer;
pub use crd::{is_kind_served, wait_for_crd};
pub use status::ConditionTracker;

use crate::constants::OPERATOR_NAME;
use kube::api::PatchParams;

/// Patch parameters carrying the operator's field manager
pub fn patch_params() -> PatchParams {
    PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}
