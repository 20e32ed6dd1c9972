//! Bounded log of past conversions.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::amount::AmountInput;
use super::currency::CurrencyCode;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Identifies a record. Handed out by a strictly increasing counter so keys
/// never repeat within a controller's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(pub u64);

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRecord {
    pub key: RecordKey,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    /// The amount as it was entered, not converted.
    pub amount: AmountInput,
    pub rate: f64,
    pub conversion_result: f64,
    pub created_at: DateTime<Utc>,
}

/// Insertion-ordered records, oldest first, never longer than `capacity`.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<ConversionRecord>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HistoryLog {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds `record` at the tail and evicts from the head until the log fits.
    pub fn append(&mut self, record: ConversionRecord) {
        debug!(key = %record.key, "History APPEND");
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            if let Some(evicted) = self.records.pop_front() {
                debug!(key = %evicted.key, "History EVICT");
            }
        }
    }

    /// Removes the record with `key`. Returns false if there was none.
    pub fn remove(&mut self, key: RecordKey) -> bool {
        match self.records.iter().position(|r| r.key == key) {
            Some(index) => {
                self.records.remove(index);
                debug!(%key, "History REMOVE");
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        debug!("History CLEAR");
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionRecord> {
        self.records.iter()
    }

    /// Snapshot of the records, oldest first.
    pub fn records(&self) -> Vec<ConversionRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
