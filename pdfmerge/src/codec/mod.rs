//! The document codec seam.
//!
//! The merge orchestrator never touches document internals. Everything it
//! needs from the document format goes through [`Codec`]: create an empty
//! output, load bytes (strictly or tolerating protection), list pages, copy
//! pages across documents and serialise the result.
//!
//! [`LopdfCodec`] implements the trait for PDF on top of `lopdf`. Tests plug
//! in scripted codecs to exercise sequencing and failure handling without
//! real documents.

pub mod pdf;

pub use pdf::LopdfCodec;

use crate::error::CodecError;

/// How strictly a document should be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Parse past encryption / permission protection without credentials.
    ///
    /// Pages of a document whose encryption genuinely withholds content may
    /// come out blank.
    pub tolerate_protection: bool,
}

impl LoadOptions {
    /// Normal parsing; protected documents are refused.
    pub fn strict() -> Self {
        Self {
            tolerate_protection: false,
        }
    }

    /// Parsing that forces its way past protection.
    pub fn tolerant() -> Self {
        Self {
            tolerate_protection: true,
        }
    }
}

/// Operations the merge orchestrator needs from a document format.
pub trait Codec: Send + Sync {
    /// In-memory document handle.
    type Document: Send;

    /// Create an empty output document.
    fn create_empty(&self) -> Result<Self::Document, CodecError>;

    /// Load a document from raw bytes.
    fn load(&self, bytes: &[u8], options: LoadOptions) -> Result<Self::Document, CodecError>;

    /// Zero-based page indices of `document`, in document order.
    fn page_indices(&self, document: &Self::Document) -> Vec<usize>;

    /// Append the pages at `indices` of `source`, in the given order, to the
    /// end of `into`. Returns the number of pages appended.
    ///
    /// `source` may be modified (e.g. renumbered) in the process.
    fn copy_pages(
        &self,
        source: &mut Self::Document,
        indices: &[usize],
        into: &mut Self::Document,
    ) -> Result<usize, CodecError>;

    /// Serialise `document` to bytes.
    fn serialize(&self, document: &mut Self::Document) -> Result<Vec<u8>, CodecError>;
}
