use std::sync::Arc;
use tempfile::TempDir;

use thrift_watcher::config::DatabaseConfig;
use thrift_watcher::models::Platform;
use thrift_watcher::store::{SeenListingStore, SqliteSeenStore};

use super::*;

async fn file_store(dir: &TempDir) -> Arc<SqliteSeenStore> {
    let config = DatabaseConfig {
        url: dir.path().join("data").join("seen.db").to_string_lossy().into_owned(),
        max_connections: 5,
    };
    Arc::new(SqliteSeenStore::connect(&config).await.unwrap())
}

#[tokio::test]
async fn test_seen_listings_survive_restart() {
    let dir = TempDir::new().unwrap();
    let phrase = "vintage pendleton board shirt";

    {
        let notifier = Arc::new(RecordingNotifier::new());
        let source = ScriptedSource::new("ebay", Platform::Ebay)
            .on(phrase, Ok(vec![ebay_candidate("Vintage Pendleton Board Shirt Wool", "11001")]));
        let store = file_store(&dir).await;
        let monitor = build_monitor(&[phrase], vec![Box::new(source)], store.clone(), notifier.clone(), 50);

        monitor.run_cycle().await.unwrap();
        assert_eq!(notifier.sent_ids(), vec!["ebay:11001"]);
        store.close().await;
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let source = ScriptedSource::new("ebay", Platform::Ebay)
        .on(phrase, Ok(vec![ebay_candidate("Vintage Pendleton Board Shirt Wool", "11001")]));
    let store = file_store(&dir).await;
    let monitor = build_monitor(&[phrase], vec![Box::new(source)], store.clone(), notifier.clone(), 50);

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.already_seen, 1);
    assert!(notifier.sent().is_empty());

    let recent = store.recent(5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].search_term, phrase);
    assert_eq!(recent[0].platform, Platform::Ebay);
}

#[tokio::test]
async fn test_overlapping_cycles_report_each_listing_once() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let phrase = "black levi made in usa";
    let candidates: Vec<_> = (0..6)
        .map(|i| ebay_candidate("Vintage Black Levi 501 Made in USA", &format!("1200{}", i)))
        .collect();

    let first_notifier = Arc::new(RecordingNotifier::new());
    let second_notifier = Arc::new(RecordingNotifier::new());
    let first = build_monitor(
        &[phrase],
        vec![Box::new(ScriptedSource::new("ebay", Platform::Ebay).on(phrase, Ok(candidates.clone())))],
        store.clone(),
        first_notifier.clone(),
        50,
    );
    let second = build_monitor(
        &[phrase],
        vec![Box::new(ScriptedSource::new("ebay", Platform::Ebay).on(phrase, Ok(candidates)))],
        store.clone(),
        second_notifier.clone(),
        50,
    );

    let (a, b) = tokio::join!(first.run_cycle(), second.run_cycle());
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(a.new_listings + b.new_listings, 6);

    let mut all_ids = first_notifier.sent_ids();
    all_ids.extend(second_notifier.sent_ids());
    all_ids.sort();
    all_ids.dedup();
    assert_eq!(all_ids.len(), 6);
    assert_eq!(first_notifier.sent_ids().len() + second_notifier.sent_ids().len(), 6);
    assert_eq!(store.count().await.unwrap(), 6);
}

#[tokio::test]
async fn test_store_reports_emptiness() {
    let store = memory_store().await;
    assert!(store.is_empty().await.unwrap());
    assert!(store.recent(10).await.unwrap().is_empty());
}
