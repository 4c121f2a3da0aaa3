//! Synthetic process source.
//!
//! [`MockSource`] is a cheaply clonable handle to a shared set of fake
//! processes. The monitor samples it instead of /proc when a test data file
//! is configured, and tests keep a clone to mutate the "operating system"
//! between sampling cycles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::process::source::{MemoryStatus, ProcessSource, SourceError};

const GIB: u64 = 1024 * 1024 * 1024;

/// One fake process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockProcess {
    pub pid: u32,
    pub path: String,
    pub command_line: String,
    /// Bytes.
    pub memory_usage: u64,
    #[serde(default)]
    pub fail_path: bool,
    #[serde(default)]
    pub fail_command_line: bool,
    #[serde(default)]
    pub fail_memory_usage: bool,
}

impl MockProcess {
    /// A process with path `path_<pid>`, command line `command_line_<pid>`
    /// and `1024 + 1024 * pid` bytes of memory.
    pub fn numbered(pid: u32) -> Self {
        Self {
            pid,
            path: format!("path_{}", pid),
            command_line: format!("command_line_{}", pid),
            memory_usage: 1024 + 1024 * pid as u64,
            fail_path: false,
            fail_command_line: false,
            fail_memory_usage: false,
        }
    }
}

/// Serialized form of a mock environment (the test data file format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockData {
    #[serde(default = "default_total_physical")]
    pub total_physical_bytes: u64,
    #[serde(default = "default_available_physical")]
    pub available_physical_bytes: u64,
    #[serde(default)]
    pub fail_memory_status: bool,
    #[serde(default)]
    pub processes: Vec<MockProcess>,
}

fn default_total_physical() -> u64 {
    4 * GIB
}
fn default_available_physical() -> u64 {
    2 * GIB
}

#[derive(Debug)]
struct MockState {
    processes: BTreeMap<u32, MockProcess>,
    status: MemoryStatus,
    fail_memory_status: bool,
}

/// Shared handle to a mock environment.
#[derive(Debug, Clone)]
pub struct MockSource {
    state: Arc<Mutex<MockState>>,
}

impl MockSource {
    /// An environment without processes, 4 GiB total and 2 GiB available.
    pub fn empty() -> Self {
        Self::from_data(MockData {
            total_physical_bytes: default_total_physical(),
            available_physical_bytes: default_available_physical(),
            fail_memory_status: false,
            processes: Vec::new(),
        })
    }

    /// An environment with processes 1..=count, see [`MockProcess::numbered`].
    pub fn generate(count: u32) -> Self {
        let source = Self::empty();
        for pid in 1..=count {
            source.insert(MockProcess::numbered(pid));
        }
        source
    }

    pub fn from_data(data: MockData) -> Self {
        let processes = data
            .processes
            .into_iter()
            .map(|p| (p.pid, p))
            .collect();
        Self {
            state: Arc::new(Mutex::new(MockState {
                processes,
                status: MemoryStatus {
                    total_bytes: data.total_physical_bytes,
                    available_bytes: data.available_physical_bytes,
                },
                fail_memory_status: data.fail_memory_status,
            })),
        }
    }

    /// Loads a test data file written by [`MockSource::save`] or the
    /// `generate-testdata` command.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path)?;
        let data: MockData = serde_json::from_str(&content).map_err(|e| SourceError::Parse {
            what: "test data file",
            detail: e.to_string(),
        })?;
        Ok(Self::from_data(data))
    }

    pub fn to_data(&self) -> MockData {
        let state = self.lock();
        MockData {
            total_physical_bytes: state.status.total_bytes,
            available_physical_bytes: state.status.available_bytes,
            fail_memory_status: state.fail_memory_status,
            processes: state.processes.values().cloned().collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SourceError> {
        let json = serde_json::to_string_pretty(&self.to_data()).map_err(|e| SourceError::Parse {
            what: "test data file",
            detail: e.to_string(),
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Adds or replaces a process.
    pub fn insert(&self, process: MockProcess) {
        self.lock().processes.insert(process.pid, process);
    }

    pub fn remove(&self, pid: u32) -> Option<MockProcess> {
        self.lock().processes.remove(&pid)
    }

    /// Applies `f` to the process with `pid`, if present.
    pub fn update<F>(&self, pid: u32, f: F) -> bool
    where
        F: FnOnce(&mut MockProcess),
    {
        match self.lock().processes.get_mut(&pid) {
            Some(p) => {
                f(p);
                true
            }
            None => false,
        }
    }

    pub fn set_available_physical(&self, bytes: u64) {
        self.lock().status.available_bytes = bytes;
    }

    pub fn set_fail_memory_status(&self, fail: bool) {
        self.lock().fail_memory_status = fail;
    }

    pub fn len(&self) -> usize {
        self.lock().processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_process<T>(
        &self,
        pid: u32,
        f: impl FnOnce(&MockProcess) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let state = self.lock();
        let process = state.processes.get(&pid).ok_or(SourceError::NotFound(pid))?;
        f(process)
    }
}

impl ProcessSource for MockSource {
    fn pids(&self) -> Vec<u32> {
        self.lock().processes.keys().copied().collect()
    }

    fn path(&self, pid: u32) -> Result<String, SourceError> {
        self.with_process(pid, |p| {
            if p.fail_path {
                Err(SourceError::AccessDenied(pid))
            } else {
                Ok(p.path.clone())
            }
        })
    }

    fn command_line(&self, pid: u32) -> Result<String, SourceError> {
        self.with_process(pid, |p| {
            if p.fail_command_line {
                Err(SourceError::AccessDenied(pid))
            } else {
                Ok(p.command_line.clone())
            }
        })
    }

    fn memory_usage(&self, pid: u32) -> Result<u64, SourceError> {
        self.with_process(pid, |p| {
            if p.fail_memory_usage {
                Err(SourceError::AccessDenied(pid))
            } else {
                Ok(p.memory_usage)
            }
        })
    }

    fn memory_status(&self) -> Result<MemoryStatus, SourceError> {
        let state = self.lock();
        if state.fail_memory_status {
            return Err(SourceError::Io(std::io::Error::other(
                "memory status unavailable",
            )));
        }
        Ok(state.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let mock = MockSource::generate(10);
        assert_eq!(mock.len(), 10);
        assert_eq!(mock.pids(), (1..=10).collect::<Vec<u32>>());
        assert_eq!(mock.path(8).unwrap(), "path_8");
        assert_eq!(mock.command_line(8).unwrap(), "command_line_8");
        assert_eq!(mock.memory_usage(8).unwrap(), 1024 + 1024 * 8);
        assert_eq!(mock.memory_status().unwrap().total_bytes, 4 * GIB);
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockSource::generate(3);
        let handle = mock.clone();
        handle.remove(2);
        handle.update(3, |p| p.fail_path = true);

        assert_eq!(mock.pids(), vec![1, 3]);
        assert!(matches!(mock.path(3), Err(SourceError::AccessDenied(3))));
        assert!(matches!(mock.path(2), Err(SourceError::NotFound(2))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("testdata.json");

        let mock = MockSource::generate(4);
        mock.set_available_physical(GIB);
        mock.save(&file).unwrap();

        let loaded = MockSource::load(&file).unwrap();
        assert_eq!(loaded.pids(), vec![1, 2, 3, 4]);
        assert_eq!(loaded.memory_status().unwrap().available_bytes, GIB);
    }

    #[test]
    fn test_memory_status_failure() {
        let mock = MockSource::empty();
        mock.set_fail_memory_status(true);
        assert!(mock.memory_status().is_err());
    }
}
