//! Integration tests for rejected input and failed runs.

use pdfmerge::{Config, MergeError, RawFile, SessionStatus};

use crate::common::{
    FailingSink, build_encrypted_pdf, memory_session, offered_markers, pdf, session_with,
};

#[tokio::test]
async fn test_unloadable_entry_aborts_and_is_named() {
    let mut session = memory_session();
    session.add_files([
        pdf("A.pdf", &["A1"]),
        RawFile::from_bytes("C.pdf", "application/pdf", b"definitely not a pdf".to_vec()),
    ]);

    let err = session.merge().await.unwrap().unwrap_err();

    assert!(matches!(err, MergeError::EntryLoadFailed { .. }));
    assert_eq!(err.entry_name(), Some("C.pdf"));
    assert!(session.sink().is_empty(), "No output may be delivered");

    let SessionStatus::Failed { message } = session.status() else {
        panic!("expected failed status, got {:?}", session.status());
    };
    assert!(message.contains("C.pdf"));
    assert!(message.contains("Certified PDFs"));
}

#[tokio::test]
async fn test_owner_protected_document_merges_through_tolerant_load() {
    let mut session = memory_session();
    session.add_files([
        pdf("A.pdf", &["A1", "A2"]),
        RawFile::from_bytes("Enc.pdf", "application/pdf", build_encrypted_pdf(&["E1", "E2"], "")),
    ]);

    let report = session.merge().await.unwrap().unwrap();

    assert_eq!(report.statistics.total_pages, 4);
    assert_eq!(report.statistics.tolerant_loads, vec!["Enc.pdf"]);
    assert_eq!(offered_markers(&session), vec!["A1", "A2", "E1", "E2"]);
}

#[tokio::test]
async fn test_password_protected_document_aborts_and_is_named() {
    let mut session = memory_session();
    session.add_files([
        pdf("A.pdf", &["A1", "A2"]),
        RawFile::from_bytes(
            "Enc.pdf",
            "application/pdf",
            build_encrypted_pdf(&["E1", "E2"], "secret"),
        ),
    ]);

    let err = session.merge().await.unwrap().unwrap_err();

    assert!(matches!(err, MergeError::EntryLoadFailed { .. }));
    assert_eq!(err.entry_name(), Some("Enc.pdf"));
    assert!(session.sink().is_empty(), "No output may be delivered");
}

#[tokio::test]
async fn test_delivery_failure_fails_the_run() {
    let mut session = session_with(Config::default(), FailingSink);
    session.add_files([pdf("A.pdf", &["A1"]), pdf("B.pdf", &["B1"])]);

    let err = session.merge().await.unwrap().unwrap_err();

    assert!(matches!(err, MergeError::DeliveryFailed { .. }));
    assert!(err.to_string().contains("download blocked"));
    assert!(matches!(session.status(), SessionStatus::Failed { .. }));
}

#[tokio::test]
async fn test_non_matching_batch_is_fully_rejected() {
    let mut session = memory_session();
    let added = session.add_files([
        RawFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec()),
        RawFile::from_bytes("photo.png", "image/png", vec![0x89, b'P', b'N', b'G']),
    ]);

    assert_eq!(added, 0);
    assert_eq!(session.status(), SessionStatus::Empty);
}

#[tokio::test]
async fn test_matching_extension_with_wrong_type_is_accepted() {
    let mut session = memory_session();
    let mut scan = pdf("scan.pdf", &["S1"]);
    scan.media_type = "application/octet-stream".to_string();

    assert_eq!(session.add_files([scan, pdf("A.pdf", &["A1"])]), 2);
    assert!(session.merge().await.unwrap().is_ok());
}

#[test]
fn test_invalid_config_rejected_at_session_start() {
    let config = Config {
        expected_extension: String::new(),
        ..Config::default()
    };
    let result = pdfmerge::MergeSession::new(
        config,
        pdfmerge::LopdfCodec::new(),
        std::sync::Arc::new(pdfmerge::MemorySink::new()),
    );
    assert!(matches!(result, Err(MergeError::InvalidConfig { .. })));
}
