//! Herakles Process Load Monitor Library
//!
//! This library samples per-process and system memory usage and keeps a
//! bounded history at two time resolutions. It is framework-agnostic: the
//! HTTP server in this package is one consumer, tests and the `test`
//! subcommand are others.
//!
//! # Features
//!
//! - **Process Identity Tracking**: every process gets a uid that survives PID reuse
//! - **Dual-Resolution History**: fast and slow ring buffers sharing rows
//! - **Windowed Queries**: merge both buffers into one series, bounded by time or tag
//! - **Pluggable Sources**: /proc on Linux or a synthetic source for tests
//!
//! # Usage
//!
//! ```rust
//! use herakles_load_monitor::{Measurement, MeasurementSettings, MockSource};
//! use chrono::Utc;
//!
//! let source = MockSource::generate(10);
//! let measurement = Measurement::new(MeasurementSettings::default(), Box::new(source)).unwrap();
//!
//! // One sampling cycle, also written to the slow log
//! measurement.sample_at(Utc::now(), true);
//!
//! let uids = measurement.matching_uids(&["path_1"]);
//! let series = measurement.query_measurements(&uids, None, None);
//! assert_eq!(series.times.len(), 1);
//!
//! for p in measurement.min_max_memory(&uids, None, None) {
//!     println!("{}: {} KB max", p.process.name, p.max_memory_in_period);
//! }
//! ```

pub mod error;
pub mod logger;
pub mod measurement;
pub mod process;
pub mod tags;

// Re-export main types for convenience
pub use error::MeasurementError;
pub use logger::{LogEntry, LogProcess, Logger, LoggerStats};
pub use measurement::{
    LogStatus, Measurement, MeasurementSettings, ProcessMeasurements, ProcessMinMaxMem, Window,
};
pub use process::{
    MockData, MockProcess, MockSource, ProcessMap, ProcessRecord, ProcessSource, ProcfsSource,
    SourceError, SystemMemory, Uid,
};
pub use tags::{TagStore, TimeBound};
