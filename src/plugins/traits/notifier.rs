use async_trait::async_trait;

use crate::models::Listing;
use crate::utils::error::NotifierError;

/// Delivery of one digest batch.
///
/// `batch_index` is 1-based; the orchestrator calls `send` once per batch in
/// order. Transport selection and retries are the implementation's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        batch: &[Listing],
        batch_index: usize,
        total_batches: usize,
    ) -> Result<(), NotifierError>;
}
