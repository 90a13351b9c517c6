//! Bounded lock acquisition.
//!
//! Global acquisition order: proposal table, then a single proposal, then
//! the membership registry, then the treasury. The table lock is released
//! before a proposal lock is awaited, and the registry lock is never held
//! while awaiting a proposal lock.

use super::error::{GovernanceError, GovernanceResult, Resource};
use crate::config::GovernanceConfig;
use crate::retry::{retry_with_backoff, RetryPolicy};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Timeout and retry settings for every lock the engine takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    timeout: Duration,
    retry: RetryPolicy,
}

impl LockPolicy {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    pub fn from_config(config: &GovernanceConfig) -> Self {
        let base = config.lock_retry_backoff();
        Self::new(
            config.lock_timeout(),
            RetryPolicy {
                max_retries: config.lock_retries,
                base_delay: base,
                max_delay: base.saturating_mul(8),
            },
        )
    }

    /// Await `acquire` for at most the configured timeout, retrying with
    /// backoff, and fail with `ConcurrencyTimeout` if it never completes.
    pub async fn acquire<F, Fut, G>(
        &self,
        resource: Resource,
        mut acquire: F,
    ) -> GovernanceResult<G>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = G>,
    {
        let timeout = self.timeout;
        let guard = retry_with_backoff(
            &self.retry,
            || {
                let pending = acquire();
                async move {
                    tokio::time::timeout(timeout, pending)
                        .await
                        .map_err(|_| GovernanceError::ConcurrencyTimeout(resource))
                }
            },
            GovernanceError::is_retryable,
        )
        .await?;

        debug!(%resource, "lock acquired");
        Ok(guard)
    }
}
