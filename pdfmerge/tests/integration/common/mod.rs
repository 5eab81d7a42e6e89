//! Shared helpers for the integration tests.
//!
//! PDFs are generated on the fly: every page carries a `/Marker` name so the
//! merged output can be checked page by page.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::{
    Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, dictionary,
};
use pdfmerge::{
    Artifact, Config, DeliverySink, LopdfCodec, MemorySink, MergeSession, RawFile, SinkHandle,
};

/// Build a PDF with one page per marker.
pub fn build_pdf(markers: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for marker in markers {
        let content = format!("BT /F1 24 Tf 72 700 Td ({marker}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Marker" => Object::Name(marker.as_bytes().to_vec()),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(markers.len() as i64),
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize test PDF");
    bytes
}

/// Build a PDF with one page per marker and RC4-128 protect it.
///
/// An empty `user_password` only sets owner restrictions, so the document
/// still opens without credentials.
pub fn build_encrypted_pdf(markers: &[&str], user_password: &str) -> Vec<u8> {
    let mut doc = Document::load_mem(&build_pdf(markers)).expect("Generated PDF did not parse");
    // lopdf's encryption requires a file identifier in the trailer.
    let file_id = Object::string_literal(b"0123456789abcdef".to_vec());
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::all(),
    })
    .expect("Failed to set up encryption");
    doc.encrypt(&state).expect("Failed to encrypt test PDF");

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize encrypted PDF");
    bytes
}

/// Page markers of a serialised PDF, in page order.
pub fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Merged output is not a valid PDF");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).expect("Page object missing");
            let marker = page.get(b"Marker").expect("Page without marker");
            String::from_utf8_lossy(marker.as_name().expect("Marker is not a name")).into_owned()
        })
        .collect()
}

/// In-memory PDF input with the given page markers.
pub fn pdf(name: &str, markers: &[&str]) -> RawFile {
    RawFile::from_bytes(name, "application/pdf", build_pdf(markers))
}

/// Write a generated PDF into `dir` and return its path.
pub fn write_pdf(dir: &Path, name: &str, markers: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(markers)).expect("Failed to write test PDF");
    path
}

/// Session over the real codec with an in-memory sink.
pub fn memory_session() -> MergeSession<LopdfCodec, MemorySink> {
    session_with(Config::default(), MemorySink::new())
}

/// Session over the real codec with the given config and sink.
pub fn session_with<S: DeliverySink>(config: Config, sink: S) -> MergeSession<LopdfCodec, S> {
    let codec = LopdfCodec::from_config(&config);
    MergeSession::new(config, codec, Arc::new(sink)).expect("Invalid test configuration")
}

/// Markers of the most recently offered artifact.
pub fn offered_markers(session: &MergeSession<LopdfCodec, MemorySink>) -> Vec<String> {
    let artifact = session
        .sink()
        .artifacts()
        .pop()
        .expect("Nothing was offered");
    page_markers(&artifact.bytes)
}

/// Sink whose save action always fails.
#[derive(Debug, Default)]
pub struct FailingSink;

impl DeliverySink for FailingSink {
    fn offer(&self, _artifact: Artifact) -> io::Result<SinkHandle> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "download blocked"))
    }

    fn dispose(&self, _handle: SinkHandle) {}
}
