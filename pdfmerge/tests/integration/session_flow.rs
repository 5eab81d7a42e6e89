//! Integration tests for collection edits, triggering and delivery timing.

use std::time::Duration;

use pdfmerge::{Config, MemorySink, SessionStatus};

use crate::common::{memory_session, offered_markers, pdf, session_with};

#[tokio::test]
async fn test_reorder_then_remove_sets_merge_order() {
    let mut session = memory_session();
    session.add_files([
        pdf("A.pdf", &["A1"]),
        pdf("B.pdf", &["B1"]),
        pdf("C.pdf", &["C1", "C2"]),
    ]);
    let ids = session.collection().ids();
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    session.reorder(&[c, a, b]).unwrap();
    session.remove(b);

    assert_eq!(session.collection().ids(), vec![c, a]);
    session.merge().await.unwrap().unwrap();
    assert_eq!(offered_markers(&session), vec!["C1", "C2", "A1"]);
}

#[tokio::test]
async fn test_removed_entry_pages_are_excluded() {
    let mut session = memory_session();
    session.add_files([
        pdf("A.pdf", &["A1"]),
        pdf("B.pdf", &["B1", "B2"]),
        pdf("C.pdf", &["C1"]),
    ]);
    let b = session.entries()[1].id();
    let c = session.entries()[2].id();

    session.remove(b);
    assert_eq!(session.collection().get(c).unwrap().name(), "C.pdf");

    session.merge().await.unwrap().unwrap();
    assert_eq!(offered_markers(&session), vec!["A1", "C1"]);
}

#[tokio::test]
async fn test_rejected_reorder_keeps_order() {
    let mut session = memory_session();
    session.add_files([pdf("A.pdf", &["A1"]), pdf("B.pdf", &["B1"])]);
    let ids = session.collection().ids();

    assert!(session.reorder(&[ids[0]]).is_err());
    assert!(session.reorder(&[ids[0], ids[0]]).is_err());
    assert_eq!(session.collection().ids(), ids);
}

#[tokio::test]
async fn test_trigger_below_threshold_is_noop() {
    let mut session = memory_session();
    assert!(session.merge().await.is_none());

    session.add_files([pdf("A.pdf", &["A1"])]);
    assert!(!session.can_merge());
    assert!(session.merge().await.is_none());
    assert!(session.sink().is_empty());
}

#[tokio::test]
async fn test_single_flight_and_snapshot_isolation() {
    let mut session = memory_session();
    session.add_files([pdf("A.pdf", &["A1"]), pdf("B.pdf", &["B1"])]);

    let run = session.begin_merge().unwrap();
    assert_eq!(session.status(), SessionStatus::Merging);
    assert!(session.begin_merge().is_none());

    // Edits after the trigger only affect the next run.
    session.add_files([pdf("C.pdf", &["C1"])]);
    let first = session.entries()[0].id();
    session.remove(first);

    let result = run.execute().await;
    session.record(&result);
    result.unwrap();

    assert_eq!(offered_markers(&session), vec!["A1", "B1"]);
    assert!(session.can_merge());

    session.merge().await.unwrap().unwrap();
    assert_eq!(offered_markers(&session), vec!["B1", "C1"]);
}

#[tokio::test]
async fn test_download_released_after_grace_period() {
    let config = Config {
        grace_period_ms: 50,
        ..Config::default()
    };
    let mut session = session_with(config, MemorySink::new());
    session.add_files([pdf("A.pdf", &["A1"]), pdf("B.pdf", &["B1"])]);

    let report = session.merge().await.unwrap().unwrap();
    assert_eq!(session.sink().len(), 1);

    tokio::time::timeout(Duration::from_secs(5), report.delivered.released())
        .await
        .expect("Download was never released");
    assert!(session.sink().is_empty());
}
