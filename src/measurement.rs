//! Sampling loop, retention and windowed queries.
//!
//! A [`Measurement`] owns a fast and a slow [`Logger`], the [`ProcessMap`]
//! and the [`TagStore`] behind one private mutex. A background tokio task
//! samples the process source every `fast_log_time_ms` milliseconds, writes
//! every row to the fast log and every `slow_log_factor`-th row to the slow
//! log. Dead processes are forgotten once they fall out of the slow log's
//! time window.
//!
//! Queries merge both logs into one chronological series: the slow log
//! contributes the rows older than anything still held by the fast log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::MeasurementError;
use crate::logger::{LogEntry, LogProcess, Logger, LoggerStats};
use crate::process::{ProcessMap, ProcessRecord, ProcessSource, SystemMemory, Uid};
use crate::tags::{TagStore, TimeBound};

pub const DEFAULT_FAST_LOG_SIZE: usize = 1200;
pub const DEFAULT_SLOW_LOG_SIZE: usize = 1440;
pub const DEFAULT_FAST_LOG_TIME_MS: u64 = 3000;
pub const DEFAULT_SLOW_LOG_FACTOR: u32 = 20;

/// Buffer sizes and sampling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSettings {
    /// Rows kept in the fast log.
    pub fast_log_size: usize,
    /// Rows kept in the slow log.
    pub slow_log_size: usize,
    /// Sampling period of the fast log.
    pub fast_log_time_ms: u64,
    /// Every Nth fast row is also written to the slow log.
    pub slow_log_factor: u32,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            fast_log_size: DEFAULT_FAST_LOG_SIZE,
            slow_log_size: DEFAULT_SLOW_LOG_SIZE,
            fast_log_time_ms: DEFAULT_FAST_LOG_TIME_MS,
            slow_log_factor: DEFAULT_SLOW_LOG_FACTOR,
        }
    }
}

impl MeasurementSettings {
    /// Rejects zero values.
    pub fn validate(&self) -> Result<(), MeasurementError> {
        let checks: [(&'static str, u64); 4] = [
            ("fast_log_size", self.fast_log_size as u64),
            ("slow_log_size", self.slow_log_size as u64),
            ("fast_log_time_ms", self.fast_log_time_ms),
            ("slow_log_factor", self.slow_log_factor as u64),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(MeasurementError::InvalidSetting { name, value });
            }
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.fast_log_time_ms)
    }

    /// Time span covered by a full fast log. Saturates at `u64::MAX` ms.
    pub fn fast_log_span(&self) -> Duration {
        span_ms(&[self.fast_log_time_ms as u128, self.fast_log_size as u128])
    }

    /// Time span covered by a full slow log. Saturates at `u64::MAX` ms.
    pub fn slow_log_span(&self) -> Duration {
        span_ms(&[
            self.fast_log_time_ms as u128,
            self.slow_log_factor as u128,
            self.slow_log_size as u128,
        ])
    }
}

fn span_ms(factors: &[u128]) -> Duration {
    let ms = factors
        .iter()
        .try_fold(1u128, |acc, f| acc.checked_mul(*f))
        .and_then(|ms| u64::try_from(ms).ok())
        .unwrap_or(u64::MAX);
    Duration::from_millis(ms)
}

/// Query window as `(from, to)`; `None` is open on that side.
pub type Window = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Memory series for a set of processes over a time window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessMeasurements {
    pub times: Vec<DateTime<Utc>>,
    /// Used physical memory of the host (KB), one value per time.
    pub system_memory: Vec<u64>,
    /// Memory per uid (KB), one value per time. Zero where the process was not alive.
    pub memory: BTreeMap<Uid, Vec<u32>>,
}

/// A process with its memory extremes inside a query window.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessMinMaxMem {
    #[serde(flatten)]
    pub process: ProcessRecord,
    pub max_memory_in_period: u32,
    pub min_memory_in_period: u32,
}

/// Snapshot of the internal state for status pages and metrics.
#[derive(Debug, Clone, Serialize)]
pub struct LogStatus {
    pub fast: LoggerStats,
    pub slow: LoggerStats,
    pub tracked: usize,
    pub alive: usize,
    pub last_update: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub last_cycle_duration: Option<Duration>,
}

struct Inner {
    fast_log: Logger,
    slow_log: Logger,
    processes: ProcessMap,
    tags: TagStore,
    last_cycle_duration: Option<Duration>,
}

impl Inner {
    fn sample(&mut self, now: DateTime<Utc>, add_to_slow_log: bool) {
        let started = Instant::now();

        self.processes.update(now);

        let rows: Vec<LogProcess> = self
            .processes
            .alive()
            .map(|p| LogProcess {
                uid: p.uid,
                memory_used: p.last_memory,
            })
            .collect();
        let entry = Arc::new(LogEntry::new(
            now,
            self.processes.system_memory().last_used,
            rows,
        ));

        if add_to_slow_log {
            self.slow_log.add_row(Arc::clone(&entry));
        }
        self.fast_log.add_row(entry);

        // Dead processes older than the slow log are not referenced by any row
        if self.slow_log.is_full() {
            if let Some(oldest) = self.slow_log.oldest_time() {
                let removed = self.processes.sweep_dead_before(oldest);
                if removed > 0 {
                    debug!("Retention sweep removed {} dead processes", removed);
                }
            }
        }

        self.last_cycle_duration = Some(started.elapsed());
    }

    /// Uids from `uids` that are known, warning about the rest.
    fn known_uids(&self, uids: &[Uid]) -> Vec<Uid> {
        uids.iter()
            .copied()
            .filter(|uid| {
                let known = self.processes.contains(*uid);
                if !known {
                    warn!("Requested measurements for unknown uid {}", uid);
                }
                known
            })
            .collect()
    }

    fn query(
        &self,
        uids: &[Uid],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ProcessMeasurements {
        let uids = self.known_uids(uids);
        let mut result = ProcessMeasurements {
            memory: uids.iter().map(|uid| (*uid, Vec::new())).collect(),
            ..Default::default()
        };

        let in_window = |time: DateTime<Utc>| {
            from.map_or(true, |from| time >= from) && to.map_or(true, |to| time <= to)
        };

        // Slow rows are only used until the fast log takes over
        let fast_oldest = self.fast_log.oldest_time();
        let slow_rows = self
            .slow_log
            .iter()
            .take_while(|row| fast_oldest.map_or(true, |oldest| row.time < oldest));

        for row in slow_rows.chain(self.fast_log.iter()) {
            if !in_window(row.time) {
                continue;
            }
            result.times.push(row.time);
            result.system_memory.push(row.memory_used);
            for (uid, values) in result.memory.iter_mut() {
                values.push(row.memory_of(*uid).unwrap_or(0));
            }
        }

        result
    }

    fn resolve_bound(&self, bound: TimeBound) -> Result<Option<DateTime<Utc>>, MeasurementError> {
        match bound {
            TimeBound::Unbounded => Ok(None),
            TimeBound::At(time) => Ok(Some(time)),
            TimeBound::Tag(name) => match self.tags.get(&name) {
                Some(time) => Ok(Some(time)),
                None => Err(MeasurementError::TagNotFound(name)),
            },
        }
    }
}

struct Running {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// The process load monitor core.
pub struct Measurement {
    settings: MeasurementSettings,
    inner: Arc<Mutex<Inner>>,
    running: Mutex<Option<Running>>,
}

impl Measurement {
    /// Creates a stopped measurement sampling `source`.
    pub fn new(
        settings: MeasurementSettings,
        source: Box<dyn ProcessSource>,
    ) -> Result<Self, MeasurementError> {
        settings.validate()?;
        let fast_log_size = NonZeroUsize::new(settings.fast_log_size).ok_or(
            MeasurementError::InvalidSetting {
                name: "fast_log_size",
                value: 0,
            },
        )?;
        let slow_log_size = NonZeroUsize::new(settings.slow_log_size).ok_or(
            MeasurementError::InvalidSetting {
                name: "slow_log_size",
                value: 0,
            },
        )?;

        Ok(Self {
            settings,
            inner: Arc::new(Mutex::new(Inner {
                fast_log: Logger::new(fast_log_size),
                slow_log: Logger::new(slow_log_size),
                processes: ProcessMap::new(source),
                tags: TagStore::new(),
                last_cycle_duration: None,
            })),
            running: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &MeasurementSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launches the sampling loop on the current tokio runtime.
    ///
    /// Does nothing if the loop is already running.
    pub fn start(&self) {
        let mut running = self.lock_running();
        if running.is_some() {
            warn!("Measurement already running, ignoring start");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(sampling_loop(
            Arc::clone(&self.inner),
            self.settings.period(),
            self.settings.slow_log_factor,
            stop_rx,
        ));
        info!(
            "Measurement started: period {} ms, slow log factor {}",
            self.settings.fast_log_time_ms, self.settings.slow_log_factor
        );
        *running = Some(Running { stop_tx, handle });
    }

    /// Signals the sampling loop to stop and waits until it has exited.
    ///
    /// Does nothing if the loop is not running.
    pub async fn stop(&self) {
        let running = self.lock_running().take();
        let Some(running) = running else {
            debug!("Measurement not running, ignoring stop");
            return;
        };

        // A closed channel also ends the loop
        let _ = running.stop_tx.send(true);
        if let Err(e) = running.handle.await {
            error!("Sampling loop terminated abnormally: {}", e);
        }
        info!("Measurement stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Runs one sampling cycle with timestamp `now`.
    pub fn sample_at(&self, now: DateTime<Utc>, add_to_slow_log: bool) {
        self.lock().sample(now, add_to_slow_log);
    }

    /// Records, keyed by uid. `None` returns every known process; unknown
    /// uids in `uids` are skipped.
    pub fn list_processes(&self, uids: Option<&[Uid]>) -> BTreeMap<Uid, ProcessRecord> {
        let inner = self.lock();
        match uids {
            None => inner
                .processes
                .records()
                .map(|p| (p.uid, p.clone()))
                .collect(),
            Some(uids) => uids
                .iter()
                .filter_map(|uid| inner.processes.get(*uid))
                .map(|p| (p.uid, p.clone()))
                .collect(),
        }
    }

    pub fn process(&self, uid: Uid) -> Result<ProcessRecord, MeasurementError> {
        self.lock()
            .processes
            .get(uid)
            .cloned()
            .ok_or(MeasurementError::UidNotFound(uid))
    }

    pub fn system_memory(&self) -> SystemMemory {
        self.lock().processes.system_memory()
    }

    /// Memory series of `uids` between `from` and `to`, both inclusive.
    /// `None` leaves that side of the window open.
    pub fn query_measurements(
        &self,
        uids: &[Uid],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ProcessMeasurements {
        self.lock().query(uids, from, to)
    }

    /// Highest and lowest memory of each known uid inside the window.
    ///
    /// A process without rows in the window reports `u32::MAX` as minimum
    /// and zero as maximum.
    pub fn min_max_memory(
        &self,
        uids: &[Uid],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<ProcessMinMaxMem> {
        let inner = self.lock();
        let measurements = inner.query(uids, from, to);

        measurements
            .memory
            .into_iter()
            .filter_map(|(uid, values)| {
                let process = inner.processes.get(uid)?.clone();
                let (max, min) = values
                    .iter()
                    .fold((0u32, u32::MAX), |(max, min), v| (max.max(*v), min.min(*v)));
                Some(ProcessMinMaxMem {
                    process,
                    max_memory_in_period: max,
                    min_memory_in_period: min,
                })
            })
            .collect()
    }

    /// Uids whose path or command line contains any of `queries`.
    pub fn matching_uids<S: AsRef<str>>(&self, queries: &[S]) -> Vec<Uid> {
        self.lock().processes.matching_uids(queries)
    }

    pub fn all_uids(&self) -> Vec<Uid> {
        self.lock().processes.uids()
    }

    /// Tags the current time as `name`.
    pub fn set_tag(&self, name: &str) -> DateTime<Utc> {
        let now = Utc::now();
        self.set_tag_at(name, now);
        now
    }

    pub fn set_tag_at(&self, name: &str, time: DateTime<Utc>) {
        debug!("Setting tag {} to {}", name, time);
        self.lock().tags.set(name, time);
    }

    pub fn get_tag(&self, name: &str) -> Result<DateTime<Utc>, MeasurementError> {
        self.lock()
            .tags
            .get(name)
            .ok_or_else(|| MeasurementError::TagNotFound(name.to_string()))
    }

    pub fn list_tags(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.lock().tags.all()
    }

    /// Turns symbolic bounds into times, looking up tags.
    pub fn resolve_window(&self, from: TimeBound, to: TimeBound) -> Result<Window, MeasurementError> {
        let inner = self.lock();
        Ok((inner.resolve_bound(from)?, inner.resolve_bound(to)?))
    }

    pub fn log_status(&self) -> LogStatus {
        let inner = self.lock();
        LogStatus {
            fast: inner.fast_log.stats(),
            slow: inner.slow_log.stats(),
            tracked: inner.processes.tracked_count(),
            alive: inner.processes.alive_count(),
            last_update: inner.processes.last_update(),
            last_cycle_duration: inner.last_cycle_duration,
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn sampling_loop(
    inner: Arc<Mutex<Inner>>,
    period: Duration,
    slow_log_factor: u32,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut cycle: u32 = 1;
    loop {
        let add_to_slow_log = cycle % slow_log_factor == 0;
        if add_to_slow_log {
            cycle = 0;
        }

        let cycle_inner = Arc::clone(&inner);
        let result = tokio::task::spawn_blocking(move || {
            lock_inner(&cycle_inner).sample(Utc::now(), add_to_slow_log);
        })
        .await;
        if let Err(e) = result {
            error!("Sampling cycle failed: {}", e);
        }

        cycle += 1;

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = stop_rx.changed() => {
                debug!("Sampling loop received stop signal");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcess, MockSource};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn settings(fast: usize, slow: usize, factor: u32) -> MeasurementSettings {
        MeasurementSettings {
            fast_log_size: fast,
            slow_log_size: slow,
            fast_log_time_ms: 10,
            slow_log_factor: factor,
        }
    }

    fn measurement(mock: &MockSource, s: MeasurementSettings) -> Measurement {
        Measurement::new(s, Box::new(mock.clone())).unwrap()
    }

    /// Samples cycles `first..first + n`, writing every `factor`-th to the slow log.
    fn run_cycles(m: &Measurement, first: i64, n: i64, factor: i64) {
        for i in first..first + n {
            m.sample_at(at(i), i % factor == 0);
        }
    }

    #[test]
    fn test_invalid_settings() {
        let mock = MockSource::generate(1);
        for s in [settings(0, 1, 1), settings(1, 0, 1), settings(1, 1, 0)] {
            assert!(matches!(
                Measurement::new(s, Box::new(mock.clone())),
                Err(MeasurementError::InvalidSetting { value: 0, .. })
            ));
        }
        let mut s = settings(1, 1, 1);
        s.fast_log_time_ms = 0;
        assert_eq!(
            s.validate(),
            Err(MeasurementError::InvalidSetting {
                name: "fast_log_time_ms",
                value: 0
            })
        );
    }

    #[test]
    fn test_sample_fills_both_logs() {
        let mock = MockSource::generate(10);
        let m = measurement(&mock, settings(100, 100, 2));
        run_cycles(&m, 1, 10, 2);

        let status = m.log_status();
        assert_eq!(status.fast.rows, 10);
        assert_eq!(status.slow.rows, 5);
        assert_eq!(status.tracked, 10);
        assert_eq!(status.alive, 10);
        assert_eq!(status.last_update, Some(at(10)));
        assert!(status.last_cycle_duration.is_some());
    }

    #[test]
    fn test_query_all_rows() {
        let mock = MockSource::generate(3);
        let m = measurement(&mock, settings(5, 5, 2));
        run_cycles(&m, 1, 4, 2);

        let uids = m.all_uids();
        let result = m.query_measurements(&uids, None, None);
        assert_eq!(result.times, (1..=4).map(at).collect::<Vec<_>>());
        assert_eq!(result.system_memory.len(), 4);
        assert_eq!(result.memory.len(), 3);
        let pid2 = m.list_processes(None).values().find(|p| p.pid == 2).unwrap().uid;
        assert_eq!(result.memory[&pid2], vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_query_straddles_slow_and_fast_logs() {
        let mock = MockSource::generate(2);
        let m = measurement(&mock, settings(3, 10, 2));
        run_cycles(&m, 1, 12, 2);

        // Fast log holds 10..=12, slow log holds 2,4,..,12
        let result = m.query_measurements(&m.all_uids(), None, None);
        let expected: Vec<DateTime<Utc>> = [2, 4, 6, 8, 10, 11, 12].into_iter().map(at).collect();
        assert_eq!(result.times, expected);
        assert!(result.times.windows(2).all(|w| w[0] < w[1]));
        for values in result.memory.values() {
            assert_eq!(values.len(), result.times.len());
        }
    }

    #[test]
    fn test_query_window() {
        let mock = MockSource::generate(2);
        let m = measurement(&mock, settings(3, 10, 2));
        run_cycles(&m, 1, 12, 2);
        let uids = m.all_uids();

        let result = m.query_measurements(&uids, Some(at(4)), Some(at(10)));
        assert_eq!(result.times, vec![at(4), at(6), at(8), at(10)]);

        let result = m.query_measurements(&uids, Some(at(11)), None);
        assert_eq!(result.times, vec![at(11), at(12)]);

        let result = m.query_measurements(&uids, None, Some(at(3)));
        assert_eq!(result.times, vec![at(2)]);

        let result = m.query_measurements(&uids, Some(at(100)), None);
        assert!(result.times.is_empty());
        assert!(result.memory.values().all(Vec::is_empty));
    }

    #[test]
    fn test_query_unknown_uid_is_omitted() {
        let mock = MockSource::generate(2);
        let m = measurement(&mock, settings(5, 5, 1));
        run_cycles(&m, 1, 2, 1);

        let result = m.query_measurements(&[1, 999], None, None);
        assert_eq!(result.memory.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(result.memory[&1].len(), 2);
    }

    #[test]
    fn test_query_dead_process_reports_zero() {
        let mock = MockSource::generate(2);
        let m = measurement(&mock, settings(10, 10, 5));
        m.sample_at(at(1), false);
        let uid = m.list_processes(None).values().find(|p| p.pid == 2).unwrap().uid;
        mock.remove(2);
        m.sample_at(at(2), false);

        let result = m.query_measurements(&[uid], None, None);
        assert_eq!(result.memory[&uid], vec![3, 0]);
        assert!(!m.process(uid).unwrap().is_alive);
    }

    #[test]
    fn test_retention_sweep() {
        let mock = MockSource::generate(3);
        let m = measurement(&mock, settings(2, 4, 1));
        m.sample_at(at(0), true);
        let dead_uid = m.list_processes(None).values().find(|p| p.pid == 3).unwrap().uid;
        mock.remove(3);
        m.sample_at(at(1), true);
        assert!(m.process(dead_uid).is_ok());

        // Slow log not full yet: dead record survives
        m.sample_at(at(2), true);
        assert_eq!(m.log_status().tracked, 3);

        // Slow log full, oldest row at(0) is before the death at(1)
        m.sample_at(at(3), true);
        assert_eq!(m.log_status().tracked, 3);

        // Oldest row now at(1), death is not strictly before it
        m.sample_at(at(4), true);
        assert_eq!(m.log_status().tracked, 3);

        // Oldest row at(2): the death falls outside the slow log
        m.sample_at(at(5), true);
        assert_eq!(m.log_status().tracked, 2);
        assert!(matches!(
            m.process(dead_uid),
            Err(MeasurementError::UidNotFound(uid)) if uid == dead_uid
        ));
    }

    #[test]
    fn test_min_max_memory() {
        let mock = MockSource::generate(1);
        let m = measurement(&mock, settings(10, 10, 5));
        for (i, kb) in [5u64, 9, 2, 7].into_iter().enumerate() {
            mock.update(1, |p| p.memory_usage = kb * 1024);
            m.sample_at(at(i as i64), false);
        }

        let result = m.min_max_memory(&[1], None, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].process.uid, 1);
        assert_eq!(result[0].max_memory_in_period, 9);
        assert_eq!(result[0].min_memory_in_period, 2);

        let result = m.min_max_memory(&[1], Some(at(3)), None);
        assert_eq!((result[0].max_memory_in_period, result[0].min_memory_in_period), (7, 7));

        // Empty window keeps the initial extremes
        let result = m.min_max_memory(&[1], Some(at(50)), None);
        assert_eq!(result[0].max_memory_in_period, 0);
        assert_eq!(result[0].min_memory_in_period, u32::MAX);

        assert!(m.min_max_memory(&[42], None, None).is_empty());
    }

    #[test]
    fn test_list_processes_and_matching() {
        let mock = MockSource::generate(12);
        mock.insert(MockProcess::numbered(100));
        let m = measurement(&mock, settings(5, 5, 1));
        m.sample_at(at(0), true);

        assert_eq!(m.list_processes(None).len(), 13);
        let some = m.list_processes(Some(&[1, 2, 500]));
        assert_eq!(some.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

        let uids = m.matching_uids(&["path_1"]);
        assert_eq!(uids.len(), 5);
        assert_eq!(m.all_uids().len(), 13);
        assert!(matches!(m.process(999), Err(MeasurementError::UidNotFound(999))));
        assert_eq!(m.system_memory().total_physical, 4 * 1024 * 1024);
    }

    #[test]
    fn test_tags_and_window_resolution() {
        let mock = MockSource::generate(1);
        let m = measurement(&mock, settings(5, 5, 1));

        m.set_tag_at("start", at(10));
        m.set_tag_at("end", at(20));
        let now = m.set_tag("later");
        assert_eq!(m.get_tag("later").unwrap(), now);
        assert_eq!(m.list_tags().len(), 3);
        assert_eq!(
            m.get_tag("missing"),
            Err(MeasurementError::TagNotFound("missing".to_string()))
        );

        let window = m
            .resolve_window(TimeBound::Tag("start".into()), TimeBound::Tag("end".into()))
            .unwrap();
        assert_eq!(window, (Some(at(10)), Some(at(20))));

        let window = m
            .resolve_window(TimeBound::Unbounded, TimeBound::At(at(5)))
            .unwrap();
        assert_eq!(window, (None, Some(at(5))));

        let err = m
            .resolve_window(TimeBound::Tag("nope".into()), TimeBound::Unbounded)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid tag: nope");
    }

    #[test]
    fn test_log_spans() {
        let s = MeasurementSettings::default();
        assert_eq!(s.fast_log_span(), Duration::from_secs(3600));
        assert_eq!(s.slow_log_span().as_secs(), 1440 * 60);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_fast_log_span_beyond_u32_rows() {
        let s = MeasurementSettings {
            fast_log_size: u32::MAX as usize + 2,
            fast_log_time_ms: 1000,
            ..MeasurementSettings::default()
        };
        assert_eq!(s.fast_log_span().as_secs(), u32::MAX as u64 + 2);
    }

    #[test]
    fn test_log_spans_saturate() {
        let s = MeasurementSettings {
            fast_log_size: 100_000_000,
            slow_log_size: 100_000_000,
            fast_log_time_ms: 3_600_000_000,
            slow_log_factor: 100_000,
        };
        assert!(s.validate().is_ok());
        assert_eq!(s.fast_log_span(), Duration::from_millis(360_000_000_000_000_000));
        assert_eq!(s.slow_log_span(), Duration::from_millis(u64::MAX));

        let s = MeasurementSettings {
            fast_log_size: usize::MAX,
            slow_log_size: usize::MAX,
            fast_log_time_ms: u64::MAX,
            slow_log_factor: u32::MAX,
        };
        assert_eq!(s.fast_log_span(), Duration::from_millis(u64::MAX));
        assert_eq!(s.slow_log_span(), Duration::from_millis(u64::MAX));
    }
}
