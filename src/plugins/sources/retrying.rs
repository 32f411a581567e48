use async_trait::async_trait;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::RetryConfig;
use crate::models::{Platform, RawCandidate};
use crate::plugins::traits::SourceAdapter;
use crate::utils::error::AdapterError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delays between attempts: base, 2x base, 4x base ... capped, with jitter.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        let factor = (self.base_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.attempts.saturating_sub(1))
    }
}

/// Wraps a source with bounded retries for transient failures.
///
/// A lost session triggers `reset()` on the inner source before the next attempt.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: SourceAdapter> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError> {
        match self.inner.search(phrase).await {
            Err(e) if e.is_session_loss() => {
                tracing::warn!(source = self.inner.name(), phrase, error = %e, "Session lost, resetting");
                if let Err(reset_err) = self.inner.reset().await {
                    tracing::error!(source = self.inner.name(), error = %reset_err, "Failed to reset source session");
                }
                Err(e)
            }
            Err(e) => {
                tracing::warn!(source = self.inner.name(), phrase, error = %e, "Search attempt failed");
                Err(e)
            }
            ok => ok,
        }
    }
}

#[async_trait]
impl<S: SourceAdapter> SourceAdapter for RetryingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn platform(&self) -> Platform {
        self.inner.platform()
    }

    async fn search(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError> {
        RetryIf::spawn(
            self.policy.delays(),
            || self.attempt(phrase),
            AdapterError::is_transient,
        )
        .await
    }

    async fn reset(&self) -> Result<(), AdapterError> {
        self.inner.reset().await
    }
}
