// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry for optimistic concurrency conflicts.

use crate::error::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff schedule for retrying a conflicting write
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the delay added at random, 0.0 disables jitter
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, used where waiting buys nothing
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay before the retry following failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jittered = if self.jitter > 0.0 {
            capped * (1.0 + rand::thread_rng().gen_range(0.0..self.jitter))
        } else {
            capped
        };
        Duration::from_secs_f64(jittered)
    }
}

/// Run `operation` until it succeeds, fails with a non-conflict error, or
/// the policy's attempts are exhausted. The last error is returned.
pub async fn retry_on_conflict<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_conflict() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                debug!(
                    operation = %operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Conflict, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!(
                        operation = %operation_name,
                        attempt,
                        error = %e,
                        "Giving up after repeated conflicts"
                    );
                }
                return Err(e);
            }
        }
    }
}
