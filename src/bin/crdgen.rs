// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prints the ExternalSecretsConfig CRD manifest

use external_secrets_operator::types::ExternalSecretsConfig;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&ExternalSecretsConfig::crd())?);
    Ok(())
}
