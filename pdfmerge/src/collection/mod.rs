//! The ordered collection of accepted documents.
//!
//! Sequence order is merge order: the pages of the entry at position N land
//! right after the pages of the entry at position N-1. Entries are keyed by
//! an [`EntryId`] that is generated once at admission and never changes or
//! gets reused, so removal and reordering never disturb other entries.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MIN_MERGE_ENTRIES;
use crate::error::{MergeError, Result};
use crate::input::RawFile;
use crate::utils::format_file_size;

/// Opaque, unique identifier of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// One accepted input document.
#[derive(Debug, Clone)]
pub struct Entry {
    id: EntryId,
    file: RawFile,
}

impl Entry {
    /// Tag an accepted file with a fresh id.
    pub(crate) fn new(file: RawFile) -> Self {
        Self {
            id: EntryId::generate(),
            file,
        }
    }

    /// The entry's id.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The underlying raw file.
    pub fn file(&self) -> &RawFile {
        &self.file
    }

    /// File name of the entry.
    pub fn name(&self) -> &str {
        &self.file.name
    }

    /// Declared size as a human-readable string.
    pub fn format_size(&self) -> String {
        format_file_size(self.file.byte_size)
    }
}

/// Mutable ordered list of entries.
#[derive(Debug, Clone, Default)]
pub struct OrderedCollection {
    entries: Vec<Entry>,
}

impl OrderedCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in merge order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Ids in merge order.
    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(Entry::id).collect()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Append entries to the end, preserving their relative order.
    ///
    /// An entry whose id is already present is skipped, so a cloned entry
    /// can never appear twice. Returns the number of entries appended.
    pub fn append<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut known: HashSet<EntryId> = self.entries.iter().map(Entry::id).collect();
        let before = self.entries.len();

        for entry in entries {
            if known.insert(entry.id) {
                self.entries.push(entry);
            }
        }

        self.entries.len() - before
    }

    /// Remove the entry with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let position = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(position))
    }

    /// Replace the order wholesale.
    ///
    /// `order` must be a permutation of exactly the current ids.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidReorder`] and leaves the order untouched if
    /// `order` has the wrong length, repeats an id or names an unknown id.
    pub fn reorder(&mut self, order: &[EntryId]) -> Result<()> {
        if order.len() != self.entries.len() {
            return Err(MergeError::invalid_reorder(format!(
                "expected {} ids, got {}",
                self.entries.len(),
                order.len()
            )));
        }

        let current: HashSet<EntryId> = self.entries.iter().map(Entry::id).collect();
        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !current.contains(id) {
                return Err(MergeError::invalid_reorder(format!("unknown id {id}")));
            }
            if !seen.insert(*id) {
                return Err(MergeError::invalid_reorder(format!("duplicate id {id}")));
            }
        }

        let mut by_id: HashMap<EntryId, Entry> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| (entry.id, entry))
            .collect();
        self.entries = order.iter().filter_map(|id| by_id.remove(id)).collect();

        Ok(())
    }

    /// Swap the positions of two entries.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidReorder`] if either id is unknown.
    pub fn swap(&mut self, a: EntryId, b: EntryId) -> Result<()> {
        let find = |id: EntryId| {
            self.entries
                .iter()
                .position(|entry| entry.id == id)
                .ok_or_else(|| MergeError::invalid_reorder(format!("unknown id {id}")))
        };
        let (i, j) = (find(a)?, find(b)?);
        self.entries.swap(i, j);
        Ok(())
    }

    /// Whether enough entries are present to merge.
    pub fn can_merge(&self) -> bool {
        self.entries.len() >= MIN_MERGE_ENTRIES
    }

    /// Copy of the current sequence for a merge run.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.clone()
    }
}
