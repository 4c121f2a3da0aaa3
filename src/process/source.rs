//! The process-enumeration capability consumed by the process map.

use std::io;

/// Errors returned by a [`ProcessSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("process {0} not found")]
    NotFound(u32),

    #[error("access denied for process {0}")]
    AccessDenied(u32),

    #[error("failed to parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SourceError {
    /// Maps an I/O error for `pid` onto NotFound/AccessDenied where it applies.
    pub fn for_pid(pid: u32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(pid),
            io::ErrorKind::PermissionDenied => SourceError::AccessDenied(pid),
            _ => SourceError::Io(err),
        }
    }
}

/// Physical memory status of the host, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStatus {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Supplies live process information from the operating system (or a fake).
pub trait ProcessSource: Send {
    /// PIDs of all live processes.
    fn pids(&self) -> Vec<u32>;

    /// Executable path of `pid`.
    fn path(&self, pid: u32) -> Result<String, SourceError>;

    /// Command line of `pid`, arguments separated by spaces.
    fn command_line(&self, pid: u32) -> Result<String, SourceError>;

    /// Resident memory of `pid` in bytes.
    fn memory_usage(&self, pid: u32) -> Result<u64, SourceError>;

    fn memory_status(&self) -> Result<MemoryStatus, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let e = SourceError::for_pid(4, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, SourceError::NotFound(4)));

        let e = SourceError::for_pid(4, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, SourceError::AccessDenied(4)));

        let e = SourceError::for_pid(4, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(e, SourceError::Io(_)));
    }
}
