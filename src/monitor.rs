use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::digest;
use crate::matcher::{PhraseCategory, RelevanceMatcher};
use crate::models::{InsertOutcome, Listing};
use crate::normalizer;
use crate::plugins::traits::{Notifier, SourceAdapter};
use crate::store::SeenListingStore;
use crate::utils::error::{CycleError, NotifierError, StoreError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    RunningSources,
    Aggregating,
    Notifying,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFailure {
    pub source: String,
    pub phrase: String,
    pub error: String,
}

/// Counters describing one pass over every source and phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub searches: usize,
    pub failed_searches: Vec<SearchFailure>,
    pub candidates: usize,
    /// Candidates the normalizer dropped.
    pub skipped: usize,
    pub already_seen: usize,
    pub irrelevant: usize,
    pub new_listings: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
}

impl Default for CycleReport {
    fn default() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0,
            searches: 0,
            failed_searches: Vec::new(),
            candidates: 0,
            skipped: 0,
            already_seen: 0,
            irrelevant: 0,
            new_listings: 0,
            batches_sent: 0,
            batches_failed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// Raw candidates kept per source per phrase.
    pub per_source_limit: usize,
    pub max_per_batch: usize,
}

impl From<&AppConfig> for MonitorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            per_source_limit: config.search.per_source_limit,
            max_per_batch: config.digest.max_per_batch,
        }
    }
}

/// Drives the search → dedup → match → notify pipeline.
pub struct Monitor {
    phrases: Vec<String>,
    sources: Vec<Box<dyn SourceAdapter>>,
    matcher: RelevanceMatcher,
    store: Arc<dyn SeenListingStore>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
    state: RwLock<CycleState>,
    /// Held for the whole of a cycle or seed; overlapping calls on one monitor queue here.
    running: Mutex<()>,
}

impl Monitor {
    pub fn new(
        phrases: Vec<String>,
        sources: Vec<Box<dyn SourceAdapter>>,
        matcher: RelevanceMatcher,
        store: Arc<dyn SeenListingStore>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            phrases,
            sources,
            matcher,
            store,
            notifier,
            settings,
            state: RwLock::new(CycleState::Idle),
            running: Mutex::new(()),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        sources: Vec<Box<dyn SourceAdapter>>,
        store: Arc<dyn SeenListingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            config.phrases(),
            sources,
            RelevanceMatcher::new(config.matcher.clone()),
            store,
            notifier,
            MonitorSettings::from(config),
        )
    }

    pub async fn state(&self) -> CycleState {
        *self.state.read().await
    }

    pub fn store(&self) -> &Arc<dyn SeenListingStore> {
        &self.store
    }

    async fn set_state(&self, state: CycleState) {
        *self.state.write().await = state;
    }

    /// Run one full cycle and deliver any new listings.
    ///
    /// Listings are recorded as seen before delivery; a failed batch is not
    /// retried by a later cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let _running = self.running.lock().await;
        let mut report = CycleReport::default();
        let started = Instant::now();
        tracing::info!(cycle_id = %report.cycle_id, phrases = self.phrases.len(), sources = self.sources.len(), "Starting monitoring cycle");

        self.set_state(CycleState::RunningSources).await;
        let discovered = self.discover(&mut report).await;

        let outcome = match discovered {
            Ok(listings) => {
                self.set_state(CycleState::Aggregating).await;
                let batches = digest::batch(listings, self.settings.max_per_batch);

                self.set_state(CycleState::Notifying).await;
                Ok(self.deliver(batches, &mut report).await)
            }
            Err(e) => Err(e),
        };

        self.set_state(CycleState::Idle).await;
        report.duration_ms = started.elapsed().as_millis() as u64;
        metrics::histogram!("thrift_watcher_cycle_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Err(e) => {
                tracing::error!(cycle_id = %report.cycle_id, error = %e, "Cycle aborted by store failure");
                metrics::counter!("thrift_watcher_cycles_total", "outcome" => "store_error").increment(1);
                Err(CycleError::Store(e))
            }
            Ok(Some(last_error)) => {
                let total = report.batches_sent + report.batches_failed;
                tracing::error!(
                    cycle_id = %report.cycle_id,
                    failed = report.batches_failed,
                    total,
                    error = %last_error,
                    "Cycle completed with undelivered batches"
                );
                metrics::counter!("thrift_watcher_cycles_total", "outcome" => "notify_error").increment(1);
                Err(CycleError::Notification {
                    failed: report.batches_failed,
                    total,
                    report: Box::new(report),
                    last_error,
                })
            }
            Ok(None) => {
                tracing::info!(
                    cycle_id = %report.cycle_id,
                    new_listings = report.new_listings,
                    batches = report.batches_sent,
                    failed_searches = report.failed_searches.len(),
                    duration_ms = report.duration_ms,
                    "Cycle completed"
                );
                metrics::counter!("thrift_watcher_cycles_total", "outcome" => "success").increment(1);
                Ok(report)
            }
        }
    }

    /// Record every currently matching listing as seen without notifying.
    pub async fn seed(&self) -> Result<CycleReport, CycleError> {
        let _running = self.running.lock().await;
        let mut report = CycleReport::default();
        let started = Instant::now();
        tracing::info!(cycle_id = %report.cycle_id, "Seeding seen listings");

        self.set_state(CycleState::RunningSources).await;
        let discovered = self.discover(&mut report).await;
        self.set_state(CycleState::Idle).await;
        report.duration_ms = started.elapsed().as_millis() as u64;

        let seeded = discovered?;
        tracing::info!(cycle_id = %report.cycle_id, seeded = seeded.len(), "Seeding completed");
        Ok(report)
    }

    async fn discover(&self, report: &mut CycleReport) -> Result<Vec<Listing>, StoreError> {
        let categories: Vec<(&str, PhraseCategory)> = self
            .phrases
            .iter()
            .map(|p| (p.as_str(), self.matcher.classify(p)))
            .collect();

        let mut accepted = Vec::new();

        for source in &self.sources {
            let mut source_new = 0usize;

            for (phrase, category) in &categories {
                report.searches += 1;

                let raw = match source.search(phrase).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(source = source.name(), phrase, error = %e, "Search failed, skipping phrase");
                        metrics::counter!("thrift_watcher_search_failures_total", "source" => source.name().to_string())
                            .increment(1);
                        report.failed_searches.push(SearchFailure {
                            source: source.name().to_string(),
                            phrase: phrase.to_string(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };

                for candidate in raw.into_iter().take(self.settings.per_source_limit) {
                    report.candidates += 1;

                    let Some(listing) = normalizer::normalize(candidate, source.platform(), phrase) else {
                        report.skipped += 1;
                        continue;
                    };

                    if self.store.has_seen(listing.listing_id()).await? {
                        report.already_seen += 1;
                        continue;
                    }

                    if !self.matcher.accepts(category, listing.title()) {
                        tracing::debug!(listing_id = listing.listing_id(), title = listing.title(), phrase, "Rejected as irrelevant");
                        report.irrelevant += 1;
                        continue;
                    }

                    match self.store.mark_seen(&listing).await? {
                        InsertOutcome::Inserted => {
                            tracing::debug!(listing_id = listing.listing_id(), title = listing.title(), phrase, "New listing");
                            source_new += 1;
                            accepted.push(listing);
                        }
                        InsertOutcome::AlreadyExists => report.already_seen += 1,
                    }
                }
            }

            tracing::info!(source = source.name(), new_listings = source_new, "Source finished");
        }

        report.new_listings = accepted.len();
        metrics::counter!("thrift_watcher_new_listings_total").increment(accepted.len() as u64);
        Ok(accepted)
    }

    /// Send batches in order. Returns the last error if any batch failed.
    async fn deliver(&self, batches: Vec<Vec<Listing>>, report: &mut CycleReport) -> Option<NotifierError> {
        let total = batches.len();
        let mut last_error = None;

        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            match self.notifier.send(batch, index, total).await {
                Ok(()) => report.batches_sent += 1,
                Err(e) => {
                    tracing::error!(batch = index, total, error = %e, "Failed to send digest batch");
                    metrics::counter!("thrift_watcher_notification_failures_total").increment(1);
                    report.batches_failed += 1;
                    last_error = Some(e);
                }
            }
        }

        last_error
    }
}
