// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_WEBHOOK_PORT: u16 = 9443;
const DEFAULT_WEBHOOK_CERT_DIR: &str = "/tmp/k8s-webhook-server/serving-certs";
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 30;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Serve the validating admission webhook
    pub webhook_enabled: bool,
    pub webhook_port: u16,
    /// Directory holding `tls.crt` and `tls.key` for the webhook server
    pub webhook_cert_dir: PathBuf,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_enabled = match lookup("WEBHOOK_ENABLED") {
            Some(v) => v
                .parse()
                .with_context(|| format!("WEBHOOK_ENABLED must be true or false, got '{}'", v))?,
            None => true,
        };

        let webhook_port = match lookup("WEBHOOK_PORT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("WEBHOOK_PORT is not a valid port: '{}'", v))?,
            None => DEFAULT_WEBHOOK_PORT,
        };

        let webhook_cert_dir = lookup("WEBHOOK_CERT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEBHOOK_CERT_DIR));

        let error_requeue_secs = match lookup("ERROR_REQUEUE_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("ERROR_REQUEUE_SECS is not a number: '{}'", v))?,
            None => DEFAULT_ERROR_REQUEUE_SECS,
        };

        Ok(Config {
            webhook_enabled,
            webhook_port,
            webhook_cert_dir,
            error_requeue: Duration::from_secs(error_requeue_secs),
        })
    }

    pub fn webhook_cert_path(&self) -> PathBuf {
        self.webhook_cert_dir.join("tls.crt")
    }

    pub fn webhook_key_path(&self) -> PathBuf {
        self.webhook_cert_dir.join("tls.key")
    }
}
