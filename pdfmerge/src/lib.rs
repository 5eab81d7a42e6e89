//! pdfmerge - Merge an ordered set of PDF documents within a user session.
//!
//! The pipeline admits picked or dropped files through an input filter,
//! keeps them in a user-ordered collection, concatenates every page of every
//! document in that order and offers the result as a single download:
//!
//! - Media-type-or-extension input filtering
//! - Stable entry ids across removal and reordering
//! - Sequential merging with a single tolerant-load fallback per document
//! - Timed disposal of the offered download
//! - Single-flight merge runs over a snapshot of the collection
//!
//! Document format details live behind the [`Codec`] trait; [`LopdfCodec`]
//! handles PDF through `lopdf`.
//!
//! # Examples
//!
//! ## Merging through a session
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdfmerge::{Config, LopdfCodec, MemorySink, MergeSession, RawFile};
//!
//! # async fn example(a: Vec<u8>, b: Vec<u8>) -> pdfmerge::Result<()> {
//! let sink = Arc::new(MemorySink::new());
//! let mut session = MergeSession::new(Config::default(), LopdfCodec::new(), sink)?;
//!
//! session.add_files([
//!     RawFile::from_bytes("a.pdf", "application/pdf", a),
//!     RawFile::from_bytes("b.pdf", "", b),
//! ]);
//!
//! match session.merge().await {
//!     Some(Ok(report)) => println!("{} pages", report.statistics.total_pages),
//!     Some(Err(err)) => eprintln!("{}", err.user_message()),
//!     None => println!("Add at least two PDFs"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the orchestrator directly
//!
//! ```no_run
//! use pdfmerge::{Entry, InputFilter, LopdfCodec, MergeOrchestrator, RawFile};
//!
//! # async fn example(files: Vec<RawFile>) -> pdfmerge::Result<()> {
//! let entries: Vec<Entry> = InputFilter::default().filter(files);
//! let output = MergeOrchestrator::new(LopdfCodec::new()).run(&entries).await?;
//! println!("{} bytes", output.bytes.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod collection;
pub mod config;
pub mod delivery;
pub mod error;
pub mod input;
pub mod merge;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use codec::{Codec, LoadOptions, LopdfCodec};
pub use collection::{Entry, EntryId, OrderedCollection};
pub use config::{CompressionLevel, Config};
pub use delivery::{Artifact, Delivered, Delivery, DeliverySink, DirectorySink, MemorySink, SinkHandle};
pub use error::{CodecError, MergeError, Result};
pub use input::{FileSource, InputFilter, RawFile};
pub use merge::{MergeOrchestrator, MergeOutput, MergeStatistics};
pub use session::{MergeReport, MergeRun, MergeSession, SessionStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
