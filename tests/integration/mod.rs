// Shared fixtures for the integration tests: scripted sources, a recording
// notifier and a store that fails on demand.

pub mod cycle_tests;
pub mod store_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thrift_watcher::config::DatabaseConfig;
use thrift_watcher::matcher::RelevanceMatcher;
use thrift_watcher::models::{InsertOutcome, Listing, Platform, RawCandidate, SeenRecord};
use thrift_watcher::monitor::{Monitor, MonitorSettings};
use thrift_watcher::plugins::{Notifier, SourceAdapter};
use thrift_watcher::store::{SeenListingStore, SqliteSeenStore};
use thrift_watcher::utils::error::{AdapterError, NotifierError, StoreError};

/// Source returning canned results per phrase and logging every call.
pub struct ScriptedSource {
    name: String,
    platform: Platform,
    script: HashMap<String, Result<Vec<RawCandidate>, AdapterError>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(name: &str, platform: Platform) -> Self {
        Self {
            name: name.to_string(),
            platform,
            script: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on(mut self, phrase: &str, result: Result<Vec<RawCandidate>, AdapterError>) -> Self {
        self.script.insert(phrase.to_string(), result);
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn search(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError> {
        self.calls.lock().unwrap().push(phrase.to_string());
        self.script.get(phrase).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Debug, Clone)]
pub struct SentBatch {
    pub listings: Vec<Listing>,
    pub index: usize,
    pub total: usize,
}

/// Notifier that keeps every batch it is handed, optionally failing some.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentBatch>>,
    fail_batches: Vec<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(batches: &[usize]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_batches: batches.to_vec(),
        }
    }

    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.sent()
            .iter()
            .flat_map(|b| b.listings.iter().map(|l| l.listing_id().to_string()))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        batch: &[Listing],
        batch_index: usize,
        total_batches: usize,
    ) -> Result<(), NotifierError> {
        if self.fail_batches.contains(&batch_index) {
            return Err(NotifierError::Transport("535 authentication failed".to_string()));
        }
        self.sent.lock().unwrap().push(SentBatch {
            listings: batch.to_vec(),
            index: batch_index,
            total: total_batches,
        });
        Ok(())
    }
}

/// Store whose every operation fails, as if the database were unreachable.
pub struct FailingStore;

#[async_trait]
impl SeenListingStore for FailingStore {
    async fn has_seen(&self, _listing_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("disk I/O error".to_string()))
    }

    async fn mark_seen(&self, _listing: &Listing) -> Result<InsertOutcome, StoreError> {
        Err(StoreError::Unavailable("disk I/O error".to_string()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("disk I/O error".to_string()))
    }

    async fn recent(&self, _limit: u32) -> Result<Vec<SeenRecord>, StoreError> {
        Err(StoreError::Unavailable("disk I/O error".to_string()))
    }
}

pub async fn memory_store() -> Arc<SqliteSeenStore> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    Arc::new(SqliteSeenStore::connect(&config).await.expect("in-memory store"))
}

pub fn ebay_candidate(title: &str, id: &str) -> RawCandidate {
    RawCandidate::new(title, id, format!("https://www.ebay.com/itm/{}", id)).with_price("$85.00")
}

pub fn depop_candidate(slug: &str) -> RawCandidate {
    RawCandidate {
        slug: Some(slug.to_string()),
        url: format!("/products/{}/", slug),
        ..RawCandidate::default()
    }
}

pub fn build_monitor(
    phrases: &[&str],
    sources: Vec<Box<dyn SourceAdapter>>,
    store: Arc<dyn SeenListingStore>,
    notifier: Arc<dyn Notifier>,
    max_per_batch: usize,
) -> Monitor {
    Monitor::new(
        phrases.iter().map(|p| p.to_string()).collect(),
        sources,
        RelevanceMatcher::default(),
        store,
        notifier,
        MonitorSettings {
            per_source_limit: 40,
            max_per_batch,
        },
    )
}
