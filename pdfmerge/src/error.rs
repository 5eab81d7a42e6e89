//! Error types for pdfmerge.
//!
//! Every failure of a merge run surfaces through [`MergeError`] as a single
//! descriptive value. Nothing is logged and swallowed: the session records the
//! error as its terminal state and hands it back to the caller.
//!
//! # Error Categories
//!
//! - **Per-entry errors**: an input could not be read or parsed, even in
//!   tolerant mode. These carry the entry's file name.
//! - **Whole-run errors**: copying pages or serialising the output failed.
//! - **Delivery errors**: the merged bytes could not be handed to the sink.
//! - **Collection / configuration errors**: rejected reorders, bad settings.
//!
//! Rejected inputs are not errors at all; the input filter drops them.

use std::io;

use thiserror::Error;

/// Result type alias for pdfmerge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Caveat appended to every user-facing failure notification.
pub const PROTECTED_DOCUMENT_NOTE: &str = "Note: Some Certified PDFs (like official diplomas) \
     have security features that prevent merging and may result in blank pages.";

/// Main error type for pdfmerge operations.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A merge was requested with fewer entries than the threshold.
    #[error("At least 2 documents are required to merge, got {count}")]
    NotEnoughEntries {
        /// Number of entries in the snapshot.
        count: usize,
    },

    /// The raw bytes behind an entry could not be read.
    #[error("Failed to read {name}\n  Reason: {source}")]
    EntryUnreadable {
        /// File name of the entry.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An entry could not be loaded, neither strictly nor in tolerant mode.
    #[error("Failed to load PDF: {name}\n  Reason: {reason}")]
    EntryLoadFailed {
        /// File name of the offending entry.
        name: String,
        /// Reason reported by the codec for the tolerant attempt.
        reason: String,
    },

    /// Copying pages into the output failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The output document could not be serialised.
    #[error("Failed to serialize merged PDF: {reason}")]
    SerializeFailed {
        /// Reason reported by the codec.
        reason: String,
    },

    /// The merged bytes could not be handed to the delivery sink.
    #[error("Failed to deliver {name}\n  Reason: {reason}")]
    DeliveryFailed {
        /// Suggested name of the artifact.
        name: String,
        /// Reason reported by the sink.
        reason: String,
    },

    /// A reorder did not describe a permutation of the current entries.
    #[error("Invalid reorder: {reason}")]
    InvalidReorder {
        /// What was wrong with the requested order.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

impl From<anyhow::Error> for MergeError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(format!("{err:#}"))
    }
}

impl MergeError {
    /// Create an EntryLoadFailed error.
    pub fn entry_load_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EntryLoadFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create a SerializeFailed error.
    pub fn serialize_failed(reason: impl Into<String>) -> Self {
        Self::SerializeFailed {
            reason: reason.into(),
        }
    }

    /// Create a DeliveryFailed error.
    pub fn delivery_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidReorder error.
    pub fn invalid_reorder(reason: impl Into<String>) -> Self {
        Self::InvalidReorder {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Name of the entry that caused this error, for per-entry failures.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::EntryUnreadable { name, .. } | Self::EntryLoadFailed { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Text for the blocking notification shown when a merge run fails.
    pub fn user_message(&self) -> String {
        format!("Failed to merge PDFs: {self}\n\n{PROTECTED_DOCUMENT_NOTE}")
    }
}

/// Failures reported by a [`Codec`](crate::codec::Codec) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The bytes could not be parsed as a document.
    #[error("couldn't parse document: {0}")]
    Parse(String),

    /// The document is protected and strict loading refuses it.
    #[error("document is encrypted or permission-protected")]
    Protected,

    /// Pages could not be copied between documents.
    #[error("couldn't copy pages: {0}")]
    Copy(String),

    /// The document could not be written out.
    #[error("couldn't serialize document: {0}")]
    Serialize(String),
}

impl From<lopdf::Error> for CodecError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
