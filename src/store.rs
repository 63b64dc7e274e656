//! Ordered log store: the append-only sequence of received entries.
//!
//! The server is the sole source of ordering truth. Batches are appended
//! in arrival order and never deduplicated or re-sorted; re-sorting could
//! reorder same-timestamp entries the server emitted in causal order.
//!
//! Retention is unbounded by default. For long-running viewers a capacity
//! limit can be set, turning the store into a ring that evicts oldest
//! entries first.

use crate::feed::TelemetryEntry;
use std::collections::VecDeque;

/// Append-only store of telemetry entries, optionally capped.
#[derive(Debug, Default)]
pub struct LogStore {
    /// Entries in arrival order, oldest first.
    entries: VecDeque<TelemetryEntry>,
    /// Maximum number of entries to retain, if any.
    max_entries: Option<usize>,
}

impl LogStore {
    /// Create an unbounded store (retain everything received).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store retaining at most `max_entries`, evicting oldest.
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries: Some(max_entries),
        }
    }

    /// Append a batch in arrival order. No dedup, no re-sort.
    ///
    /// Once appended, an entry's position relative to its neighbors never
    /// changes; the only other mutation is oldest-eviction in capped mode.
    pub fn append(&mut self, batch: Vec<TelemetryEntry>) {
        self.entries.extend(batch);
        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
    }

    /// All retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryEntry> {
        self.entries.iter()
    }

    /// Entry at `index` from the oldest retained one.
    pub fn get(&self, index: usize) -> Option<&TelemetryEntry> {
        self.entries.get(index)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
