//! Ringbuffer module for the sampled memory history.
//!
//! A [`Logger`] is a fixed-size circular buffer of [`LogEntry`] snapshots.
//! The monitor keeps two of them: a fast log written every sampling cycle
//! and a slow log written every Nth cycle. Entries are shared between the
//! two logs through an [`Arc`], so a row written to both costs one allocation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::process::Uid;

/// Memory used by one process at sampling time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LogProcess {
    pub uid: Uid,
    pub memory_used: u32, // KB
}

/// One snapshot of all processes alive at a certain time.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    /// Total physical memory in use (KB).
    pub memory_used: u64,
    /// Sorted by uid.
    pub processes: Vec<LogProcess>,
}

impl LogEntry {
    /// Creates an entry, ordering `processes` by uid.
    pub fn new(time: DateTime<Utc>, memory_used: u64, mut processes: Vec<LogProcess>) -> Self {
        processes.sort_unstable_by_key(|p| p.uid);
        Self {
            time,
            memory_used,
            processes,
        }
    }

    /// Memory used by `uid` in this snapshot, or None if it was not alive.
    pub fn memory_of(&self, uid: Uid) -> Option<u32> {
        self.processes
            .binary_search_by_key(&uid, |p| p.uid)
            .ok()
            .map(|i| self.processes[i].memory_used)
    }
}

/// Summary of a logger's fill state.
#[derive(Debug, Clone, Serialize)]
pub struct LoggerStats {
    pub capacity: usize,
    pub rows: usize,
    pub utilization_percent: u32,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// A circular buffer of log entries with fixed capacity.
pub struct Logger {
    slots: Vec<Option<Arc<LogEntry>>>,
    capacity: usize,
    write_index: usize,
    count: usize,
}

impl Logger {
    /// Creates a logger with `capacity` preallocated empty slots.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        let mut slots = Vec::with_capacity(capacity);
        slots.resize(capacity, None);

        Self {
            slots,
            capacity,
            write_index: 0,
            count: 0,
        }
    }

    /// Adds a row. If the buffer is full the oldest row is overwritten.
    pub fn add_row(&mut self, entry: Arc<LogEntry>) {
        self.slots[self.write_index] = Some(entry);
        self.write_index = (self.write_index + 1) % self.capacity;

        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Physical slot of the oldest row, or None if nothing was written yet.
    pub fn oldest_index(&self) -> Option<usize> {
        if self.count == 0 {
            None
        } else if self.count < self.capacity {
            Some(0)
        } else {
            Some(self.write_index)
        }
    }

    /// Timestamp of the oldest row.
    pub fn oldest_time(&self) -> Option<DateTime<Utc>> {
        self.oldest_index()
            .and_then(|i| self.slots[i].as_ref())
            .map(|e| e.time)
    }

    /// Timestamp of the most recently written row.
    pub fn newest_time(&self) -> Option<DateTime<Utc>> {
        if self.count == 0 {
            return None;
        }
        let newest = (self.write_index + self.capacity - 1) % self.capacity;
        self.slots[newest].as_ref().map(|e| e.time)
    }

    /// Iterates rows oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        let start = self.oldest_index().unwrap_or(0);
        (0..self.count).filter_map(move |offset| {
            self.slots[(start + offset) % self.capacity].as_deref()
        })
    }

    /// Raw access to a physical slot, ignoring logical order.
    ///
    /// Diagnostic accessor for inspecting the buffer layout; queries use [`Logger::iter`].
    pub fn slot(&self, index: usize) -> Option<&LogEntry> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// Returns the number of rows written (saturates at capacity).
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns the maximum capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next slot to be written.
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            capacity: self.capacity,
            rows: self.count,
            utilization_percent: (self.count * 100 / self.capacity) as u32,
            oldest: self.oldest_time(),
            newest: self.newest_time(),
        }
    }
}
