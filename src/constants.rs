// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label marking CRDs the operator is allowed to mutate
pub mod labels {
    pub const MANAGED_KEY: &str = "external-secrets.io/component";
    pub const MANAGED_VALUE: &str = "controller";
    /// Label selector matching every managed CRD
    pub const MANAGED_SELECTOR: &str = "external-secrets.io/component=controller";
}

/// Annotation injected on managed CRDs when annotation injection is enabled
pub mod annotations {
    pub const INJECT_CA_FROM: &str = "cert-manager.io/inject-ca-from";
    pub const INJECT_CA_FROM_VALUE: &str = "external-secrets/external-secrets-webhook";
}

/// Well-known name of the singleton ExternalSecretsConfig
pub const CONFIG_NAME: &str = "cluster";

/// Reconcile request name that selects the bulk annotation path.
/// Not a valid Kubernetes object name, so it can never collide with a CRD.
pub const RECONCILE_ALL_SENTINEL: &str = "_all_managed_crds_";

/// Requeue delay for errors that are expected to clear quickly
/// (cache warming up, status write conflicts)
pub const TRANSIENT_REQUEUE_SECS: u64 = 5;

/// The operator name used as field manager
pub const OPERATOR_NAME: &str = "external-secrets-operator";

/// Status condition types and reasons
pub mod conditions {
    pub const UPDATE_ANNOTATION: &str = "UpdateAnnotation";
    pub const REASON_COMPLETED: &str = "Completed";
    pub const REASON_FAILED: &str = "Failed";
}

/// Secret provider guarded by the admission webhook
pub mod provider {
    /// Key under `spec.provider` of a SecretStore
    pub const KEY: &str = "bitwardensecretsmanager";
    /// Maximum number of referencing resources listed in a rejection
    pub const MAX_LISTED_RESOURCES: usize = 5;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
