//! Integration tests for the ringbuffer logger.
//!
//! These tests verify the wraparound behavior of [`Logger`] through its
//! public API for a range of capacities and write counts.

use chrono::{DateTime, TimeZone, Utc};
use herakles_load_monitor::{LogEntry, LogProcess, Logger};
use std::num::NonZeroUsize;
use std::sync::Arc;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
}

fn row(secs: i64) -> Arc<LogEntry> {
    Arc::new(LogEntry::new(
        at(secs),
        secs as u64,
        vec![LogProcess {
            uid: 1,
            memory_used: secs as u32,
        }],
    ))
}

fn logger(capacity: usize) -> Logger {
    Logger::new(NonZeroUsize::new(capacity).unwrap())
}

/// After n writes the logger holds the last min(n, capacity) rows in order.
#[test]
fn test_wraparound_law() {
    for capacity in [1usize, 2, 3, 7, 16] {
        for writes in 0..(3 * capacity + 2) {
            let mut log = logger(capacity);
            for i in 0..writes {
                log.add_row(row(i as i64));
            }

            let kept = writes.min(capacity);
            assert_eq!(log.len(), kept, "capacity {capacity}, writes {writes}");
            assert_eq!(log.write_index(), writes % capacity);
            assert_eq!(log.is_full(), writes >= capacity);

            let first = (writes - kept) as i64;
            let times: Vec<DateTime<Utc>> = log.iter().map(|e| e.time).collect();
            let expected: Vec<DateTime<Utc>> = (first..writes as i64).map(at).collect();
            assert_eq!(times, expected, "capacity {capacity}, writes {writes}");

            if writes == 0 {
                assert!(log.oldest_time().is_none());
                assert!(log.newest_time().is_none());
                assert!(log.oldest_index().is_none());
            } else {
                assert_eq!(log.oldest_time(), Some(at(first)));
                assert_eq!(log.newest_time(), Some(at(writes as i64 - 1)));
            }
        }
    }
}

/// The oldest row sits in the slot that is written next once the buffer is full.
#[test]
fn test_oldest_slot_follows_write_index() {
    let mut log = logger(4);
    for i in 0..10 {
        log.add_row(row(i));
        if log.is_full() {
            assert_eq!(log.oldest_index(), Some(log.write_index()));
        } else {
            assert_eq!(log.oldest_index(), Some(0));
        }
    }
    // Rows 6..10 in slots 2, 3, 0, 1
    assert_eq!(log.slot(2).map(|e| e.time), Some(at(6)));
    assert_eq!(log.slot(1).map(|e| e.time), Some(at(9)));
    assert!(log.slot(4).is_none());
}

/// A row shared by two logs survives eviction from one of them.
#[test]
fn test_shared_rows() {
    let mut fast = logger(2);
    let mut slow = logger(8);

    for i in 0..6 {
        let entry = row(i);
        if i % 3 == 0 {
            slow.add_row(Arc::clone(&entry));
        }
        fast.add_row(entry);
    }

    assert_eq!(
        fast.iter().map(|e| e.time).collect::<Vec<_>>(),
        vec![at(4), at(5)]
    );
    assert_eq!(
        slow.iter().map(|e| e.memory_of(1)).collect::<Vec<_>>(),
        vec![Some(0), Some(3)]
    );
}

#[test]
fn test_stats_utilization() {
    let mut log = logger(8);
    for i in 0..2 {
        log.add_row(row(i));
    }
    let stats = log.stats();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.capacity, 8);
    assert_eq!(stats.utilization_percent, 25);
    assert_eq!(stats.oldest, Some(at(0)));
    assert_eq!(stats.newest, Some(at(1)));
}
