//! The merge session.
//!
//! A [`MergeSession`] owns the ordered collection for the lifetime of one
//! user session and wires the input filter, the orchestrator and delivery
//! together. It is the only writer of the collection; merge runs read a
//! snapshot taken when they are triggered, so editing the collection while a
//! run is in flight never affects that run.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdfmerge::{Config, DirectorySink, LopdfCodec, MergeSession, RawFile};
//!
//! # async fn example() -> pdfmerge::Result<()> {
//! let config = Config::default();
//! let sink = Arc::new(DirectorySink::new("downloads"));
//! let mut session = MergeSession::new(config, LopdfCodec::new(), sink)?;
//!
//! session.add_files([
//!     RawFile::from_path("a.pdf".as_ref()).await?,
//!     RawFile::from_path("b.pdf".as_ref()).await?,
//! ]);
//!
//! if let Some(result) = session.merge().await {
//!     let report = result?;
//!     println!("Offered {} ({} pages)", report.delivered.name, report.statistics.total_pages);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::codec::Codec;
use crate::collection::{Entry, EntryId, OrderedCollection};
use crate::config::Config;
use crate::delivery::{Delivered, Delivery, DeliverySink};
use crate::error::Result;
use crate::input::{InputFilter, RawFile};
use crate::merge::{MergeOrchestrator, MergeStatistics};

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionStatus {
    /// No entries.
    Empty,
    /// Fewer entries than needed to merge; the trigger is disabled.
    BelowThreshold,
    /// Enough entries to merge.
    Ready,
    /// A run is in flight; the trigger is disabled.
    Merging,
    /// The last run finished and its download was offered.
    Succeeded {
        /// Name the merged document was offered under.
        name: String,
    },
    /// The last run failed.
    Failed {
        /// User-facing failure message.
        message: String,
    },
}

/// Report of a successful run.
#[derive(Debug)]
pub struct MergeReport {
    /// Statistics about the merge.
    pub statistics: MergeStatistics,

    /// The offered artifact.
    pub delivered: Delivered,
}

#[derive(Debug, Clone)]
enum Outcome {
    Succeeded(String),
    Failed(String),
}

/// Clears the in-flight flag when the run it belongs to ends.
#[derive(Debug)]
struct FlightGuard(Arc<AtomicBool>);

impl FlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One triggered merge run, bound to the snapshot taken at trigger time.
///
/// The session stays in [`SessionStatus::Merging`] until the run is executed
/// or dropped.
#[derive(Debug)]
pub struct MergeRun<C, S> {
    entries: Vec<Entry>,
    orchestrator: Arc<MergeOrchestrator<C>>,
    delivery: Delivery<S>,
    _guard: FlightGuard,
}

impl<C: Codec, S: DeliverySink> MergeRun<C, S> {
    /// The captured snapshot, in merge order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Merge the snapshot and offer the result to the delivery sink.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the run. No partial document is ever
    /// delivered.
    #[instrument(skip_all, fields(entries = self.entries.len()))]
    pub async fn execute(self) -> Result<MergeReport> {
        let output = self.orchestrator.run(&self.entries).await?;
        let delivered = self.delivery.deliver(output.bytes).await?;
        Ok(MergeReport {
            statistics: output.statistics,
            delivered,
        })
    }
}

/// A user session: collection, filter, orchestrator and delivery.
#[derive(Debug)]
pub struct MergeSession<C, S> {
    config: Config,
    filter: InputFilter,
    collection: OrderedCollection,
    orchestrator: Arc<MergeOrchestrator<C>>,
    delivery: Delivery<S>,
    in_flight: Arc<AtomicBool>,
    outcome: Option<Outcome>,
}

impl<C: Codec, S: DeliverySink> MergeSession<C, S> {
    /// Start a session with an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`](crate::MergeError::InvalidConfig)
    /// if `config` fails validation.
    pub fn new(config: Config, codec: C, sink: Arc<S>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            filter: InputFilter::from_config(&config),
            collection: OrderedCollection::new(),
            orchestrator: Arc::new(MergeOrchestrator::new(codec)),
            delivery: Delivery::new(sink, &config),
            in_flight: Arc::new(AtomicBool::new(false)),
            outcome: None,
            config,
        })
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The codec merges run against.
    pub fn codec(&self) -> &C {
        self.orchestrator.codec()
    }

    /// The delivery sink.
    pub fn sink(&self) -> &Arc<S> {
        self.delivery.sink()
    }

    /// Filter a batch of picked or dropped files and append the accepted ones.
    ///
    /// Returns the number of entries added.
    pub fn add_files<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = RawFile>,
    {
        let added = self.filter.admit(batch, &mut self.collection);
        if added > 0 {
            self.outcome = None;
        }
        debug!(added, total = self.collection.len(), "Files added");
        added
    }

    /// Remove an entry. Absent ids are a no-op.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let removed = self.collection.remove(id);
        if removed.is_some() {
            self.outcome = None;
        }
        removed
    }

    /// Replace the merge order with a permutation of the current ids.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidReorder`](crate::MergeError::InvalidReorder)
    /// and leaves the order unchanged if `order` is not a permutation of the
    /// current ids.
    pub fn reorder(&mut self, order: &[EntryId]) -> Result<()> {
        self.collection.reorder(order)?;
        self.outcome = None;
        Ok(())
    }

    /// Swap two entries.
    pub fn swap(&mut self, a: EntryId, b: EntryId) -> Result<()> {
        self.collection.swap(a, b)?;
        self.outcome = None;
        Ok(())
    }

    /// Entries in merge order.
    pub fn entries(&self) -> &[Entry] {
        self.collection.entries()
    }

    /// The live collection.
    pub fn collection(&self) -> &OrderedCollection {
        &self.collection
    }

    /// Whether the merge trigger is enabled.
    pub fn can_merge(&self) -> bool {
        self.collection.can_merge() && !self.is_merging()
    }

    /// Whether a run is in flight.
    pub fn is_merging(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Current observable state.
    pub fn status(&self) -> SessionStatus {
        if self.is_merging() {
            return SessionStatus::Merging;
        }

        match &self.outcome {
            Some(Outcome::Succeeded(name)) => SessionStatus::Succeeded { name: name.clone() },
            Some(Outcome::Failed(message)) => SessionStatus::Failed {
                message: message.clone(),
            },
            None if self.collection.is_empty() => SessionStatus::Empty,
            None if !self.collection.can_merge() => SessionStatus::BelowThreshold,
            None => SessionStatus::Ready,
        }
    }

    /// Trigger a run against a snapshot of the current collection.
    ///
    /// Returns `None`, and does nothing, when the collection is below the
    /// merge threshold or another run is still in flight.
    pub fn begin_merge(&self) -> Option<MergeRun<C, S>> {
        if !self.collection.can_merge() {
            debug!(entries = self.collection.len(), "Merge trigger ignored below threshold");
            return None;
        }

        let Some(guard) = FlightGuard::acquire(&self.in_flight) else {
            debug!("Merge trigger ignored while a run is in flight");
            return None;
        };

        Some(MergeRun {
            entries: self.collection.snapshot(),
            orchestrator: Arc::clone(&self.orchestrator),
            delivery: self.delivery.clone(),
            _guard: guard,
        })
    }

    /// Record the result of a run as the session's terminal state.
    pub fn record(&mut self, result: &Result<MergeReport>) {
        self.outcome = Some(match result {
            Ok(report) => Outcome::Succeeded(report.delivered.name.clone()),
            Err(err) => Outcome::Failed(err.user_message()),
        });
    }

    /// Trigger, execute and record a run.
    ///
    /// Returns `None` when the trigger is disabled.
    pub async fn merge(&mut self) -> Option<Result<MergeReport>> {
        let run = self.begin_merge()?;
        let result = run.execute().await;
        self.record(&result);
        Some(result)
    }
}

impl<C, S> MergeSession<C, S> {
    /// Last recorded failure, if the session is in the failed state.
    pub fn last_error_message(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Failed(message)) => Some(message),
            _ => None,
        }
    }
}
