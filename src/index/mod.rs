//! Pending Change Index
//!
//! Key → latest pending record captured from delta logs.
//!
//! ## Responsibilities
//! - O(1) destructive lookup (`pop`) while matching base records
//! - Drain every remaining entry exactly once for the tail phase
//!
//! Built completely by a log scanner before reading starts; afterwards keys
//! are only ever removed.

use std::collections::hash_map::{self, HashMap};

use crate::record::Record;
use crate::sequence::LazySequence;
use crate::error::Result;

/// Index of pending changes keyed by record key
#[derive(Debug, Default)]
pub struct PendingChangeIndex {
    records: HashMap<String, Record>,
}

impl PendingChangeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the pending record for `record.key()`.
    /// Returns the record previously stored for that key.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.key().to_string(), record)
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Remove and return the pending record for `key`
    pub fn pop(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Move every remaining entry out of the index. The index is empty
    /// afterwards; the returned sequence yields each entry once, in no
    /// particular order.
    pub fn take_remaining(&mut self) -> ResidualRecords {
        ResidualRecords {
            inner: std::mem::take(&mut self.records).into_values(),
            current: None,
        }
    }
}

impl FromIterator<Record> for PendingChangeIndex {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut index = PendingChangeIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Owned drain of the records left in a [`PendingChangeIndex`]
pub struct ResidualRecords {
    inner: hash_map::IntoValues<String, Record>,
    current: Option<Record>,
}

impl ResidualRecords {
    /// Number of records not yet yielded
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }
}

impl Iterator for ResidualRecords {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl LazySequence for ResidualRecords {
    type Item = Record;

    fn advance(&mut self) -> Result<bool> {
        self.current = self.inner.next();
        Ok(self.current.is_some())
    }

    fn current(&mut self) -> Option<Record> {
        self.current.take()
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        for _ in self.inner.by_ref() {}
        Ok(())
    }
}
