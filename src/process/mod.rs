//! Process-related modules for identity tracking and process sources.
//!
//! This module provides:
//! - `map`: Process identity tracking across PID reuse
//! - `source`: The process-enumeration capability
//! - `procfs`: Linux source reading /proc
//! - `mock`: Synthetic source for tests and test data files

pub mod map;
pub mod mock;
pub mod procfs;
pub mod source;

// Re-export commonly used types
pub use map::{name_from_path, ProcessMap, ProcessRecord, SystemMemory, Uid};
pub use mock::{MockData, MockProcess, MockSource};
pub use procfs::ProcfsSource;
pub use source::{MemoryStatus, ProcessSource, SourceError};
