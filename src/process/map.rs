//! Process identity tracking.
//!
//! The operating system reuses PIDs, so every process observed by the
//! monitor gets a surrogate [`Uid`] that is never reused. [`ProcessMap`]
//! keeps all records keyed on uid, plus an index from PID to uid for the
//! processes that are currently alive.

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::process::source::ProcessSource;

/// Surrogate process identity, unique for the lifetime of the monitor.
pub type Uid = u64;

/// One tracked process across its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub uid: Uid,
    pub pid: u32,
    pub is_alive: bool,
    pub path: String,
    pub name: String,
    pub command_line: String,
    /// KB
    pub max_memory_ever: u32,
    /// KB
    pub min_memory_ever: u32,
    /// KB, zero when the last sample failed.
    pub last_memory: u32,
    pub created: DateTime<Utc>,
    pub died: Option<DateTime<Utc>>,
    #[serde(skip)]
    sampled: bool,
}

impl ProcessRecord {
    fn new(uid: Uid, pid: u32, path: String, command_line: String, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            pid,
            is_alive: true,
            name: name_from_path(&path).to_string(),
            path,
            command_line,
            max_memory_ever: 0,
            min_memory_ever: 0,
            last_memory: 0,
            created: now,
            died: None,
            sampled: false,
        }
    }

    /// Records a successful memory sample (KB).
    fn record_memory(&mut self, kb: u32) {
        self.last_memory = kb;
        if kb > self.max_memory_ever {
            self.max_memory_ever = kb;
        }
        if !self.sampled || kb < self.min_memory_ever {
            self.min_memory_ever = kb;
        }
        self.sampled = true;
    }

    fn matches(&self, query: &str) -> bool {
        self.path.contains(query) || self.command_line.contains(query)
    }
}

/// Last path segment, accepting both `/` and `\` separators.
pub fn name_from_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Physical memory of the host (KB).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SystemMemory {
    pub total_physical: u64,
    pub max_used_ever: u64,
    pub min_used_ever: u64,
    /// Zero when the last sample failed.
    pub last_used: u64,
    #[serde(skip)]
    sampled: bool,
}

impl SystemMemory {
    fn record(&mut self, total_kb: u64, used_kb: u64) {
        self.total_physical = total_kb;
        self.last_used = used_kb;
        if used_kb > self.max_used_ever {
            self.max_used_ever = used_kb;
        }
        if !self.sampled || used_kb < self.min_used_ever {
            self.min_used_ever = used_kb;
        }
        self.sampled = true;
    }
}

/// All processes ever seen (until swept) plus the index of the living ones.
pub struct ProcessMap {
    next_uid: Uid,
    by_uid: BTreeMap<Uid, ProcessRecord>,
    by_pid: HashMap<u32, Uid>,
    system: SystemMemory,
    last_update: Option<DateTime<Utc>>,
    source: Box<dyn ProcessSource>,
}

impl ProcessMap {
    pub fn new(source: Box<dyn ProcessSource>) -> Self {
        Self {
            next_uid: 0,
            by_uid: BTreeMap::new(),
            by_pid: HashMap::new(),
            system: SystemMemory::default(),
            last_update: None,
            source,
        }
    }

    /// Refreshes all records from the process source.
    ///
    /// A failure for a single PID only degrades that PID's data for this
    /// cycle. Processes whose PID disappeared, or whose PID now belongs to a
    /// different executable, are marked dead.
    pub fn update(&mut self, now: DateTime<Utc>) {
        for uid in self.by_pid.values() {
            if let Some(record) = self.by_uid.get_mut(uid) {
                record.is_alive = false;
            }
        }

        for pid in self.source.pids() {
            if pid == 0 {
                // Idle pseudo-process
                continue;
            }
            self.update_pid(pid, now);
        }

        self.last_update = Some(now);

        let vanished: Vec<u32> = self
            .by_pid
            .iter()
            .filter(|(_, uid)| self.by_uid.get(uid).is_some_and(|r| !r.is_alive))
            .map(|(pid, _)| *pid)
            .collect();
        for pid in vanished {
            debug!("Process with PID {} vanished", pid);
            self.kill_pid(pid, now);
        }

        match self.source.memory_status() {
            Ok(status) => {
                let total_kb = status.total_bytes / 1024;
                let used_kb = status.total_bytes.saturating_sub(status.available_bytes) / 1024;
                self.system.record(total_kb, used_kb);
            }
            Err(e) => {
                debug!("Failed to read system memory status: {}", e);
                self.system.last_used = 0;
            }
        }
    }

    fn update_pid(&mut self, pid: u32, now: DateTime<Utc>) {
        let mut existing = self.by_pid.get(&pid).copied();

        let path = match self.source.path(pid) {
            Ok(path) if !path.is_empty() => path,
            Ok(_) | Err(_) => {
                // Probably a system process we cannot access
                if existing.is_some() {
                    self.kill_pid(pid, now);
                }
                return;
            }
        };

        if let Some(uid) = existing {
            if self.by_uid.get(&uid).is_some_and(|r| r.path != path) {
                debug!("PID {} reused by {}", pid, path);
                self.kill_pid(pid, now);
                existing = None;
            }
        }

        let uid = match existing {
            Some(uid) => uid,
            None => self.create(pid, path, now),
        };

        let memory = self.source.memory_usage(pid);
        let Some(record) = self.by_uid.get_mut(&uid) else {
            return;
        };
        record.is_alive = true;
        match memory {
            Ok(bytes) => {
                let kb = u32::try_from(bytes / 1024).unwrap_or(u32::MAX);
                record.record_memory(kb);
            }
            Err(e) => {
                debug!("Failed to read memory usage for PID {}: {}", pid, e);
                record.last_memory = 0;
            }
        }
    }

    fn create(&mut self, pid: u32, path: String, now: DateTime<Utc>) -> Uid {
        let command_line = self.source.command_line(pid).unwrap_or_else(|e| {
            debug!("Failed to read command line for PID {}: {}", pid, e);
            String::new()
        });
        self.next_uid += 1;
        let uid = self.next_uid;
        debug!("New process uid={} pid={} path={}", uid, pid, path);
        self.by_uid
            .insert(uid, ProcessRecord::new(uid, pid, path, command_line, now));
        self.by_pid.insert(pid, uid);
        uid
    }

    /// Marks the live process at `pid` as dead and drops it from the PID index.
    pub fn kill_pid(&mut self, pid: u32, now: DateTime<Utc>) {
        if let Some(uid) = self.by_pid.remove(&pid) {
            if let Some(record) = self.by_uid.get_mut(&uid) {
                record.is_alive = false;
                record.died = Some(now);
            }
        }
    }

    /// Removes dead records that died before `cutoff`. Returns the number removed.
    pub fn sweep_dead_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.by_uid.len();
        self.by_uid
            .retain(|_, r| r.is_alive || r.died.map_or(true, |died| died >= cutoff));
        before - self.by_uid.len()
    }

    /// UIDs whose path or command line contains any of `queries`.
    pub fn matching_uids<S: AsRef<str>>(&self, queries: &[S]) -> Vec<Uid> {
        let mut uids = BTreeSet::new();
        for query in queries {
            let query = query.as_ref();
            uids.extend(
                self.by_uid
                    .values()
                    .filter(|r| r.matches(query))
                    .map(|r| r.uid),
            );
        }
        uids.into_iter().collect()
    }

    pub fn get(&self, uid: Uid) -> Option<&ProcessRecord> {
        self.by_uid.get(&uid)
    }

    /// Live record currently holding `pid`.
    ///
    /// Diagnostic lookup by OS pid; everything else addresses records by uid.
    pub fn get_by_pid(&self, pid: u32) -> Option<&ProcessRecord> {
        self.by_pid.get(&pid).and_then(|uid| self.by_uid.get(uid))
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.by_uid.contains_key(&uid)
    }

    /// All records, ordered by uid.
    pub fn records(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.by_uid.values()
    }

    /// Live records, in no particular order.
    pub fn alive(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.by_pid.values().filter_map(|uid| self.by_uid.get(uid))
    }

    pub fn uids(&self) -> Vec<Uid> {
        self.by_uid.keys().copied().collect()
    }

    /// Number of records, dead or alive.
    pub fn tracked_count(&self) -> usize {
        self.by_uid.len()
    }

    pub fn alive_count(&self) -> usize {
        self.by_pid.len()
    }

    pub fn system_memory(&self) -> SystemMemory {
        self.system
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::{MockProcess, MockSource};
    use chrono::{Duration, TimeZone};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn map_with(mock: &MockSource) -> ProcessMap {
        ProcessMap::new(Box::new(mock.clone()))
    }

    #[test]
    fn test_name_from_path() {
        assert_eq!(name_from_path("/usr/bin/nginx"), "nginx");
        assert_eq!(name_from_path("C:\\Windows\\explorer.exe"), "explorer.exe");
        assert_eq!(name_from_path("path_8"), "path_8");
    }

    #[test]
    fn test_process_update() {
        let mock = MockSource::generate(10);
        let mut map = map_with(&mock);
        map.update(at(0));
        assert_eq!(map.tracked_count(), 10);
        assert_eq!(map.alive_count(), 10);

        let p8 = map.get_by_pid(8).unwrap().clone();
        assert_eq!(p8.pid, 8);
        assert_eq!(p8.path, "path_8");
        assert_eq!(p8.command_line, "command_line_8");
        assert_eq!(p8.max_memory_ever, 9);
        assert_eq!(p8.min_memory_ever, 9);
        assert_eq!(p8.last_memory, 9);
        assert_eq!(p8.created, at(0));

        mock.update(8, |p| p.memory_usage = 1024 * 20);
        map.update(at(1));
        let p = map.get(p8.uid).unwrap();
        assert_eq!((p.max_memory_ever, p.min_memory_ever, p.last_memory), (20, 9, 20));

        mock.update(8, |p| p.memory_usage = 1024 * 3);
        map.update(at(2));
        let p = map.get(p8.uid).unwrap();
        assert_eq!((p.max_memory_ever, p.min_memory_ever, p.last_memory), (20, 3, 3));

        mock.update(8, |p| p.memory_usage = 1024 * 4);
        map.update(at(3));
        let p = map.get(p8.uid).unwrap();
        assert_eq!((p.max_memory_ever, p.min_memory_ever, p.last_memory), (20, 3, 4));
        assert_eq!(map.alive_count(), 10);

        // PID 8 terminates
        mock.remove(8);
        map.update(at(4));
        assert_eq!(map.tracked_count(), 10);
        assert_eq!(map.alive_count(), 9);
        assert!(map.get_by_pid(8).is_none());
        let dead = map.get(p8.uid).unwrap();
        assert!(!dead.is_alive);
        assert_eq!(dead.died, Some(at(4)));

        // PID 3 reused by another executable
        let p3_uid = map.get_by_pid(3).unwrap().uid;
        mock.update(3, |p| p.path = "new_path_3".to_string());
        map.update(at(5));
        assert_eq!(map.tracked_count(), 11);
        assert_eq!(map.alive_count(), 9);
        let new_p3 = map.get_by_pid(3).unwrap();
        assert_ne!(new_p3.uid, p3_uid);
        assert_eq!(new_p3.name, "new_path_3");
        assert!(!map.get(p3_uid).unwrap().is_alive);

        // PID 2 becomes inaccessible
        let p2_uid = map.get_by_pid(2).unwrap().uid;
        mock.update(2, |p| p.path = String::new());
        map.update(at(6));
        assert_eq!(map.tracked_count(), 11);
        assert_eq!(map.alive_count(), 8);
        assert!(!map.get(p2_uid).unwrap().is_alive);

        // New process
        mock.insert(MockProcess::numbered(34));
        map.update(at(7));
        assert_eq!(map.tracked_count(), 12);
        assert_eq!(map.alive_count(), 9);
        assert_eq!(map.get_by_pid(34).unwrap().path, "path_34");

        // Processes without a path are ignored
        let mut p22 = MockProcess::numbered(22);
        p22.path = String::new();
        mock.insert(p22);
        let mut p23 = MockProcess::numbered(23);
        p23.fail_path = true;
        mock.insert(p23);
        map.update(at(8));
        assert_eq!(map.tracked_count(), 12);
        assert_eq!(map.alive_count(), 9);
        assert!(map.get_by_pid(22).is_none());
        assert!(map.get_by_pid(23).is_none());

        // Command line and memory failures degrade the record only
        let mut p24 = MockProcess::numbered(24);
        p24.fail_command_line = true;
        p24.fail_memory_usage = true;
        mock.insert(p24);
        map.update(at(9));
        assert_eq!(map.tracked_count(), 13);
        assert_eq!(map.alive_count(), 10);
        let p24 = map.get_by_pid(24).unwrap();
        assert_eq!(p24.command_line, "");
        assert_eq!(p24.last_memory, 0);
    }

    #[test]
    fn test_system_memory() {
        let mock = MockSource::generate(1);
        let mut map = map_with(&mock);
        map.update(at(0));

        let mb = 1024 * 1024; // KB per GiB
        let sys = map.system_memory();
        assert_eq!(sys.total_physical, 4 * mb);
        assert_eq!((sys.max_used_ever, sys.min_used_ever, sys.last_used), (2 * mb, 2 * mb, 2 * mb));

        mock.set_available_physical(3 * GIB);
        map.update(at(1));
        let sys = map.system_memory();
        assert_eq!((sys.max_used_ever, sys.min_used_ever, sys.last_used), (2 * mb, mb, mb));

        mock.set_available_physical(GIB);
        map.update(at(2));
        let sys = map.system_memory();
        assert_eq!((sys.max_used_ever, sys.min_used_ever, sys.last_used), (3 * mb, mb, 3 * mb));

        mock.set_fail_memory_status(true);
        map.update(at(3));
        let sys = map.system_memory();
        assert_eq!(sys.total_physical, 4 * mb);
        assert_eq!((sys.max_used_ever, sys.min_used_ever, sys.last_used), (3 * mb, mb, 0));
        // Process updates continue regardless
        assert_eq!(map.alive_count(), 1);
        assert_eq!(map.last_update(), Some(at(3)));
    }

    #[test]
    fn test_uid_stable_while_alive() {
        let mock = MockSource::generate(5);
        let mut map = map_with(&mock);
        map.update(at(0));
        let uid = map.get_by_pid(4).unwrap().uid;
        for i in 1..20 {
            mock.update(4, |p| p.memory_usage = 1024 * (i % 7) as u64);
            map.update(at(i));
            let record = map.get_by_pid(4).unwrap();
            assert_eq!(record.uid, uid);
            assert!(record.min_memory_ever <= record.last_memory);
            assert!(record.last_memory <= record.max_memory_ever);
        }
    }

    #[test]
    fn test_pid_reappearing_gets_new_uid() {
        let mock = MockSource::generate(2);
        let mut map = map_with(&mock);
        map.update(at(0));
        let old = map.get_by_pid(2).unwrap().uid;

        mock.remove(2);
        map.update(at(1));
        let mut reborn = MockProcess::numbered(2);
        reborn.path = "other_2".to_string();
        mock.insert(reborn);
        map.update(at(2));

        let new = map.get_by_pid(2).unwrap().uid;
        assert_ne!(new, old);
        assert!(new > old);
    }

    #[test]
    fn test_min_memory_zero_is_a_real_sample() {
        let mock = MockSource::empty();
        let mut p = MockProcess::numbered(1);
        p.memory_usage = 0;
        mock.insert(p);
        let mut map = map_with(&mock);
        map.update(at(0));

        mock.update(1, |p| p.memory_usage = 5 * 1024);
        map.update(at(1));
        let record = map.get_by_pid(1).unwrap();
        assert_eq!(record.min_memory_ever, 0);
        assert_eq!(record.max_memory_ever, 5);
    }

    #[test]
    fn test_matching_uids() {
        let mock = MockSource::generate(12);
        let mut map = map_with(&mock);
        map.update(at(0));

        // "path_1" matches 1, 10, 11 and 12
        assert_eq!(map.matching_uids(&["path_1"]).len(), 4);
        assert_eq!(map.matching_uids(&["command_line_5"]).len(), 1);
        // OR combination without duplicates
        let uids = map.matching_uids(&["path_1", "path_11", "command_line_2"]);
        assert_eq!(uids.len(), 5);
        assert!(uids.windows(2).all(|w| w[0] < w[1]));
        // Case sensitive
        assert!(map.matching_uids(&["PATH_1"]).is_empty());
    }

    #[test]
    fn test_sweep_dead_before() {
        let mock = MockSource::generate(3);
        let mut map = map_with(&mock);
        map.update(at(0));
        mock.remove(1);
        map.update(at(10));
        mock.remove(2);
        map.update(at(20));

        assert_eq!(map.sweep_dead_before(at(10)), 0);
        assert_eq!(map.sweep_dead_before(at(10) + Duration::seconds(1)), 1);
        assert_eq!(map.tracked_count(), 2);
        assert_eq!(map.sweep_dead_before(at(100)), 1);
        // Alive processes are never swept
        assert_eq!(map.tracked_count(), 1);
        assert_eq!(map.alive_count(), 1);
    }
}
