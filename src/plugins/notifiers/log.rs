use async_trait::async_trait;

use crate::models::Listing;
use crate::plugins::traits::Notifier;
use crate::utils::error::NotifierError;

/// Writes digest batches to the log instead of delivering them. Used for dry runs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        batch: &[Listing],
        batch_index: usize,
        total_batches: usize,
    ) -> Result<(), NotifierError> {
        tracing::info!(
            listings = batch.len(),
            batch = batch_index,
            total = total_batches,
            "Dry run digest batch"
        );
        for listing in batch {
            tracing::info!(
                listing_id = listing.listing_id(),
                search_term = listing.search_term(),
                price = listing.price(),
                url = listing.url(),
                "{}",
                listing.title()
            );
        }
        Ok(())
    }
}
