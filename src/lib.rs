// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod provider;
pub mod reconcilers;
pub mod retry;
pub mod types;
pub mod webhook;

#[cfg(test)]
pub mod test_utils;
