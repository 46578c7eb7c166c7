//! Sorted merge with key deduplication.
//!
//! Records are folded into an output vector that stays sorted by key. A record
//! whose key is already present is merged into the existing entry; anything
//! else is inserted at its sorted position. The result depends only on the
//! order records are fed in, never on when they arrived.

use super::record::{Collation, Record};
use std::cmp::Ordering;

/// Output sequence of a merge, kept sorted ascending by key.
#[derive(Debug)]
pub struct SortedMerge<R> {
    entries: Vec<R>,
    collation: Collation,
    merged: usize,
}

impl<R: Record> SortedMerge<R> {
    pub fn new(collation: Collation) -> Self {
        Self {
            entries: Vec::new(),
            collation,
            merged: 0,
        }
    }

    /// Insert one record, merging it into an existing entry with the same key.
    pub fn insert(&mut self, record: R) {
        let collation = self.collation;
        // First entry whose key is >= record.key
        let idx = self
            .entries
            .partition_point(|entry| collation.compare(entry.key(), record.key()) == Ordering::Less);

        match self.entries.get_mut(idx) {
            Some(entry) if entry.key() == record.key() => {
                entry.merge_with(record);
                self.merged += 1;
            }
            _ => self.entries.insert(idx, record),
        }
    }

    /// Insert every record of one provider's list, in the order given.
    pub fn extend<I: IntoIterator<Item = R>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of incoming records absorbed into an existing entry.
    pub fn merged_count(&self) -> usize {
        self.merged
    }

    pub fn into_vec(self) -> Vec<R> {
        self.entries
    }
}

/// Merge per-provider lists, processed in the order given.
pub fn merge_sorted<R, I, L>(lists: L, collation: Collation) -> Vec<R>
where
    R: Record,
    I: IntoIterator<Item = R>,
    L: IntoIterator<Item = I>,
{
    let mut merge = SortedMerge::new(collation);
    for list in lists {
        merge.extend(list);
    }
    merge.into_vec()
}
