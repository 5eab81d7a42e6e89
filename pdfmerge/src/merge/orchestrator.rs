//! Sequential merge of a snapshot of entries.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::{Codec, LoadOptions};
use crate::collection::Entry;
use crate::config::MIN_MERGE_ENTRIES;
use crate::error::{MergeError, Result};
use crate::utils::format_file_size;

/// Statistics about a merge operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStatistics {
    /// Number of documents merged.
    pub files_merged: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Sum of the declared input sizes.
    pub input_size: u64,

    /// Size of the serialised output.
    pub output_size: u64,

    /// Names of entries that only loaded in tolerant mode.
    pub tolerant_loads: Vec<String>,

    /// Total time taken for the run, serialisation included.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a successful merge run.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The serialised merged document.
    pub bytes: Vec<u8>,

    /// Statistics about the run.
    pub statistics: MergeStatistics,
}

/// Runs the merge pipeline against a [`Codec`].
#[derive(Debug, Clone)]
pub struct MergeOrchestrator<C> {
    codec: C,
}

impl<C: Codec> MergeOrchestrator<C> {
    /// Create an orchestrator backed by `codec`.
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// The codec this orchestrator drives.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Merge `entries`, in order, into a single serialised document.
    ///
    /// Entries are processed one at a time: the next entry's bytes are only
    /// read once every page of the previous entry has been copied. An entry
    /// that fails to load strictly is retried exactly once in tolerant mode.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two entries are given
    /// - An entry's bytes cannot be read, or it fails to load in both modes
    ///   (the error names the entry)
    /// - Copying pages or serialising the output fails
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn run(&self, entries: &[Entry]) -> Result<MergeOutput> {
        if entries.len() < MIN_MERGE_ENTRIES {
            return Err(MergeError::NotEnoughEntries {
                count: entries.len(),
            });
        }

        let start = Instant::now();
        info!("Starting merge run");

        let mut output = self
            .codec
            .create_empty()
            .map_err(|e| MergeError::merge_failed(e.to_string()))?;

        let mut total_pages = 0;
        let mut tolerant_loads = Vec::new();

        for entry in entries {
            let bytes = entry
                .file()
                .read_bytes()
                .await
                .map_err(|source| MergeError::EntryUnreadable {
                    name: entry.name().to_string(),
                    source,
                })?;

            let (mut document, tolerant) = self.load_entry(entry, &bytes)?;
            if tolerant {
                tolerant_loads.push(entry.name().to_string());
            }

            let indices = self.codec.page_indices(&document);
            let copied = self
                .codec
                .copy_pages(&mut document, &indices, &mut output)
                .map_err(|e| {
                    error!(name = %entry.name(), error = %e, "Copying pages failed");
                    MergeError::merge_failed(e.to_string())
                })?;

            debug!(name = %entry.name(), pages = copied, "Entry merged");
            total_pages += copied;

            // Let other tasks run before the next document is read.
            tokio::task::yield_now().await;
        }

        let bytes = self
            .codec
            .serialize(&mut output)
            .map_err(|e| MergeError::serialize_failed(e.to_string()))?;

        let statistics = MergeStatistics {
            files_merged: entries.len(),
            total_pages,
            input_size: entries.iter().map(|e| e.file().byte_size).sum(),
            output_size: bytes.len() as u64,
            tolerant_loads,
            merge_time: start.elapsed(),
        };

        info!(
            files = statistics.files_merged,
            pages = statistics.total_pages,
            output = %statistics.format_output_size(),
            "Merge run finished"
        );

        Ok(MergeOutput { bytes, statistics })
    }

    /// Load one entry, falling back to tolerant mode once.
    ///
    /// Returns the document and whether the fallback was needed.
    fn load_entry(&self, entry: &Entry, bytes: &[u8]) -> Result<(C::Document, bool)> {
        match self.codec.load(bytes, LoadOptions::strict()) {
            Ok(document) => Ok((document, false)),
            Err(strict_err) => {
                warn!(
                    name = %entry.name(),
                    error = %strict_err,
                    "Strict load failed, retrying with protection ignored"
                );
                self.codec
                    .load(bytes, LoadOptions::tolerant())
                    .map(|document| (document, true))
                    .map_err(|e| MergeError::entry_load_failed(entry.name(), e.to_string()))
            }
        }
    }
}
