use std::sync::Arc;

use thrift_watcher::models::Platform;
use thrift_watcher::monitor::CycleState;
use thrift_watcher::store::SeenListingStore;
use thrift_watcher::utils::error::{AdapterError, CycleError};

use super::*;

const PHRASES: [&str; 5] = [
    "navy champion reverse weave",
    "yale champion reverse weave",
    "stanford champion reverse weave",
    "princeton champion reverse weave",
    "vintage champion reverse weave",
];

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let store = memory_store().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let source = ScriptedSource::new("ebay", Platform::Ebay).on(
        PHRASES[0],
        Ok(vec![
            ebay_candidate("Vintage Navy Champion Reverse Weave Hoodie", "1001"),
            ebay_candidate("Champion Reverse Weave Crewneck", "1002"),
        ]),
    );
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], store.clone(), notifier.clone(), 50);

    let first = monitor.run_cycle().await.unwrap();
    let second = monitor.run_cycle().await.unwrap();

    assert_eq!(first.new_listings, 2);
    assert_eq!(second.new_listings, 0);
    assert_eq!(second.already_seen, 2);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_across_phrases_reported_once() {
    let notifier = Arc::new(RecordingNotifier::new());
    let listing = ebay_candidate("Vintage Navy Champion Reverse Weave Sweatshirt", "2001");
    let source = ScriptedSource::new("ebay", Platform::Ebay)
        .on(PHRASES[0], Ok(vec![listing.clone()]))
        .on(PHRASES[4], Ok(vec![listing]));
    let monitor = build_monitor(
        &[PHRASES[0], PHRASES[4]],
        vec![Box::new(source)],
        memory_store().await,
        notifier.clone(),
        50,
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.new_listings, 1);
    assert_eq!(report.already_seen, 1);
    assert_eq!(notifier.sent_ids(), vec!["ebay:2001"]);
    assert_eq!(notifier.sent()[0].listings[0].search_term(), PHRASES[0]);
}

#[tokio::test]
async fn test_adapter_failure_does_not_abort_cycle() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut source = ScriptedSource::new("ebay", Platform::Ebay);
    for (i, phrase) in PHRASES.iter().enumerate() {
        let result = if i == 2 {
            Err(AdapterError::Timeout(60))
        } else {
            Ok(vec![ebay_candidate("Champion Reverse Weave Hoodie", &format!("300{}", i))])
        };
        source = source.on(phrase, result);
    }
    let calls = source.call_log();
    let monitor = build_monitor(&PHRASES, vec![Box::new(source)], memory_store().await, notifier.clone(), 50);

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(*calls.lock().unwrap(), PHRASES.to_vec());
    assert_eq!(report.searches, 5);
    assert_eq!(report.failed_searches.len(), 1);
    assert_eq!(report.failed_searches[0].phrase, PHRASES[2]);
    assert_eq!(report.new_listings, 4);
    assert_eq!(notifier.sent_ids(), vec!["ebay:3000", "ebay:3001", "ebay:3003", "ebay:3004"]);
}

#[tokio::test]
async fn test_store_failure_aborts_without_notification() {
    let notifier = Arc::new(RecordingNotifier::new());
    let source = ScriptedSource::new("ebay", Platform::Ebay)
        .on(PHRASES[0], Ok(vec![ebay_candidate("Champion Reverse Weave Hoodie", "4001")]));
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], Arc::new(FailingStore), notifier.clone(), 50);

    let result = monitor.run_cycle().await;

    assert!(matches!(result, Err(CycleError::Store(_))));
    assert!(notifier.sent().is_empty());
    assert_eq!(monitor.state().await, CycleState::Idle);
}

#[tokio::test]
async fn test_notifier_failure_is_not_rolled_back() {
    let store = memory_store().await;
    let failing = Arc::new(RecordingNotifier::failing_on(&[1]));
    let candidates = vec![
        ebay_candidate("Champion Reverse Weave Hoodie", "5001"),
        ebay_candidate("Champion Reverse Weave Crew", "5002"),
        ebay_candidate("Champion Reverse-Weave Sweatshirt", "5003"),
    ];
    let source = ScriptedSource::new("ebay", Platform::Ebay).on(PHRASES[0], Ok(candidates.clone()));
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], store.clone(), failing.clone(), 2);

    match monitor.run_cycle().await {
        Err(CycleError::Notification { report, failed, total, .. }) => {
            assert_eq!((failed, total), (1, 2));
            assert_eq!(report.batches_sent, 1);
        }
        other => panic!("expected notification failure, got {:?}", other.map(|r| r.new_listings)),
    }

    // The second batch was still attempted.
    let sent = failing.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].index, 2);

    // Nothing is resent on the next cycle.
    let notifier = Arc::new(RecordingNotifier::new());
    let source = ScriptedSource::new("ebay", Platform::Ebay).on(PHRASES[0], Ok(candidates));
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], store.clone(), notifier.clone(), 2);

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.new_listings, 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_batches_are_ordered_and_one_based() {
    let notifier = Arc::new(RecordingNotifier::new());
    let candidates = (0..5)
        .map(|i| ebay_candidate("Champion Reverse Weave Hoodie", &format!("600{}", i)))
        .collect();
    let source = ScriptedSource::new("ebay", Platform::Ebay).on(PHRASES[0], Ok(candidates));
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], memory_store().await, notifier.clone(), 2);

    monitor.run_cycle().await.unwrap();

    let sent = notifier.sent();
    let shape: Vec<(usize, usize, usize)> = sent.iter().map(|b| (b.index, b.total, b.listings.len())).collect();
    assert_eq!(shape, vec![(1, 3, 2), (2, 3, 2), (3, 3, 1)]);
    assert_eq!(
        notifier.sent_ids(),
        vec!["ebay:6000", "ebay:6001", "ebay:6002", "ebay:6003", "ebay:6004"]
    );
}

#[tokio::test]
async fn test_sources_run_in_configured_order() {
    let notifier = Arc::new(RecordingNotifier::new());
    let ebay = ScriptedSource::new("ebay", Platform::Ebay)
        .on(PHRASES[0], Ok(vec![ebay_candidate("Champion Reverse Weave Hoodie", "7001")]));
    let depop = ScriptedSource::new("depop", Platform::Depop)
        .on(PHRASES[0], Ok(vec![depop_candidate("navy-champion-reverse-weave-crew")]));
    let monitor = build_monitor(
        &PHRASES[..1],
        vec![Box::new(ebay), Box::new(depop)],
        memory_store().await,
        notifier.clone(),
        50,
    );

    monitor.run_cycle().await.unwrap();

    let sent = notifier.sent();
    assert_eq!(
        notifier.sent_ids(),
        vec!["ebay:7001", "depop:navy-champion-reverse-weave-crew"]
    );
    assert_eq!(sent[0].listings[1].title(), "Navy Champion Reverse Weave Crew");
    assert_eq!(
        sent[0].listings[1].url(),
        "https://www.depop.com/products/navy-champion-reverse-weave-crew/"
    );
}

#[tokio::test]
async fn test_seed_then_cycle_reports_only_fresh_listings() {
    let store = memory_store().await;
    let notifier = Arc::new(RecordingNotifier::new());

    let seed_source = ScriptedSource::new("ebay", Platform::Ebay)
        .on(PHRASES[0], Ok(vec![ebay_candidate("Champion Reverse Weave Hoodie", "8001")]));
    let seeder = build_monitor(&PHRASES[..1], vec![Box::new(seed_source)], store.clone(), notifier.clone(), 50);
    let seeded = seeder.seed().await.unwrap();
    assert_eq!(seeded.new_listings, 1);
    assert!(notifier.sent().is_empty());

    let source = ScriptedSource::new("ebay", Platform::Ebay).on(
        PHRASES[0],
        Ok(vec![
            ebay_candidate("Champion Reverse Weave Hoodie", "8001"),
            ebay_candidate("Champion Reverse Weave Crewneck", "8002"),
        ]),
    );
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], store.clone(), notifier.clone(), 50);
    monitor.run_cycle().await.unwrap();

    assert_eq!(notifier.sent_ids(), vec!["ebay:8002"]);
}

#[tokio::test]
async fn test_irrelevant_listings_are_not_recorded() {
    let store = memory_store().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let source = ScriptedSource::new("ebay", Platform::Ebay).on(
        PHRASES[0],
        Ok(vec![
            ebay_candidate("Champion Style Reverse Weave Hoodie", "9001"),
            ebay_candidate("Navy Champion Hoodie", "9002"),
        ]),
    );
    let monitor = build_monitor(&PHRASES[..1], vec![Box::new(source)], store.clone(), notifier.clone(), 50);

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.irrelevant, 2);
    assert!(notifier.sent().is_empty());
    assert!(!store.has_seen("ebay:9001").await.unwrap());
}
