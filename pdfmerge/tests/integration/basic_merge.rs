//! Integration tests for basic merging through a session.

use pdfmerge::{CompressionLevel, Config, DirectorySink, MemorySink, RawFile, SessionStatus};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{
    memory_session, offered_markers, page_markers, pdf, session_with, write_pdf,
};

#[tokio::test]
async fn test_merge_two_documents_in_order() {
    let mut session = memory_session();
    session.add_files([pdf("A.pdf", &["A1", "A2"]), pdf("B.pdf", &["B1", "B2", "B3"])]);

    let report = session.merge().await.unwrap().unwrap();

    assert_eq!(report.statistics.files_merged, 2);
    assert_eq!(report.statistics.total_pages, 5);
    assert_eq!(offered_markers(&session), vec!["A1", "A2", "B1", "B2", "B3"]);
    assert!(matches!(session.status(), SessionStatus::Succeeded { .. }));
}

#[tokio::test]
async fn test_reordered_collection_merges_in_reverse() {
    let mut session = memory_session();
    session.add_files([pdf("A.pdf", &["A1", "A2"]), pdf("B.pdf", &["B1"])]);

    let ids = session.collection().ids();
    session.reorder(&[ids[1], ids[0]]).unwrap();
    session.merge().await.unwrap().unwrap();

    assert_eq!(offered_markers(&session), vec!["B1", "A1", "A2"]);
}

#[tokio::test]
async fn test_same_document_added_twice() {
    let mut session = memory_session();
    let doc = pdf("A.pdf", &["A1"]);
    session.add_files([doc.clone(), doc]);

    assert_eq!(session.entries().len(), 2);
    session.merge().await.unwrap().unwrap();
    assert_eq!(offered_markers(&session), vec!["A1", "A1"]);
}

#[tokio::test]
async fn test_offered_artifact_is_named_and_typed() {
    let mut session = memory_session();
    session.add_files([pdf("A.pdf", &["A1"]), pdf("B.pdf", &["B1"])]);

    let report = session.merge().await.unwrap().unwrap();
    let artifact = session.sink().get(report.delivered.handle).unwrap();

    assert!(artifact.suggested_name.starts_with("merged_"));
    assert!(artifact.suggested_name.ends_with(".pdf"));
    assert_eq!(artifact.media_type, "application/pdf");
    assert_eq!(report.delivered.byte_size, artifact.bytes.len() as u64);
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_every_compression_level_yields_valid_output(#[case] compression: CompressionLevel) {
    let config = Config {
        compression,
        ..Config::default()
    };
    let mut session = session_with(config, MemorySink::new());
    session.add_files([
        pdf("A.pdf", &["A1"]),
        pdf("B.pdf", &["B1", "B2"]),
        pdf("C.pdf", &["C1"]),
    ]);

    session.merge().await.unwrap().unwrap();
    let artifact = session.sink().artifacts().pop().unwrap();
    assert_eq!(page_markers(&artifact.bytes), vec!["A1", "B1", "B2", "C1"]);
}

#[tokio::test]
async fn test_files_from_disk_into_downloads_directory() {
    let temp = TempDir::new().unwrap();
    let a = write_pdf(temp.path(), "a.pdf", &["A1", "A2"]);
    let b = write_pdf(temp.path(), "b.PDF", &["B1"]);
    let downloads = temp.path().join("downloads");

    let mut session = session_with(Config::default(), DirectorySink::new(&downloads));
    session.add_files([
        RawFile::from_path(&a).await.unwrap(),
        RawFile::from_path(&b).await.unwrap(),
    ]);

    let report = session.merge().await.unwrap().unwrap();
    let saved = downloads.join(&report.delivered.name);

    assert!(saved.exists(), "Output file was not created");
    let bytes = std::fs::read(&saved).unwrap();
    assert_eq!(page_markers(&bytes), vec!["A1", "A2", "B1"]);
    assert_eq!(
        report.statistics.input_size,
        std::fs::metadata(&a).unwrap().len() + std::fs::metadata(&b).unwrap().len()
    );
}
