//! Linux process source reading from the /proc filesystem.
//!
//! PIDs come from the numeric directories under /proc, paths from the
//! `exe` link, resident memory from `VmRSS` in `status` and the host memory
//! status from `/proc/meminfo`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::process::source::{MemoryStatus, ProcessSource, SourceError};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Process source backed by a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROC_ROOT)
    }

    /// Uses `root` instead of /proc. Mainly for tests against a fake tree.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl ProcessSource for ProcfsSource {
    fn pids(&self) -> Vec<u32> {
        collect_pids(&self.root)
    }

    fn path(&self, pid: u32) -> Result<String, SourceError> {
        let exe = fs::read_link(self.pid_dir(pid).join("exe"))
            .map_err(|e| SourceError::for_pid(pid, e))?;
        // Replaced executables show up as "/usr/bin/foo (deleted)"
        let path = exe.to_string_lossy();
        Ok(path.trim_end_matches(" (deleted)").to_string())
    }

    fn command_line(&self, pid: u32) -> Result<String, SourceError> {
        let content =
            fs::read(self.pid_dir(pid).join("cmdline")).map_err(|e| SourceError::for_pid(pid, e))?;
        Ok(parse_cmdline(&content))
    }

    fn memory_usage(&self, pid: u32) -> Result<u64, SourceError> {
        let content = fs::read_to_string(self.pid_dir(pid).join("status"))
            .map_err(|e| SourceError::for_pid(pid, e))?;
        parse_vmrss_bytes(&content)
    }

    fn memory_status(&self) -> Result<MemoryStatus, SourceError> {
        let content = fs::read_to_string(self.root.join("meminfo"))?;
        parse_meminfo(&content)
    }
}

/// Scans a procfs root for directories with numeric names.
pub fn collect_pids(root: &Path) -> Vec<u32> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse() {
                out.push(pid);
            }
        }
    }
    out.sort_unstable();
    out
}

/// Joins the NUL-separated arguments of a cmdline file with spaces.
pub fn parse_cmdline(content: &[u8]) -> String {
    content
        .split(|&b| b == 0u8)
        .filter(|s| !s.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses kilobyte values from status/meminfo lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Converts a kilobyte field to bytes, rejecting values that overflow.
fn kb_field_bytes(what: &'static str, v: &str) -> Result<u64, SourceError> {
    parse_kb_value(v)
        .and_then(|kb| kb.checked_mul(1024))
        .ok_or_else(|| SourceError::Parse {
            what,
            detail: v.trim().to_string(),
        })
}

/// Reads `VmRSS` from the content of /proc/<pid>/status, in bytes.
///
/// Kernel threads have no `VmRSS` line; they count as zero.
pub fn parse_vmrss_bytes(status: &str) -> Result<u64, SourceError> {
    for line in status.lines() {
        if let Some(v) = line.strip_prefix("VmRSS:") {
            return kb_field_bytes("VmRSS", v);
        }
    }
    Ok(0)
}

/// Reads MemTotal and MemAvailable from the content of /proc/meminfo.
pub fn parse_meminfo(content: &str) -> Result<MemoryStatus, SourceError> {
    let mut total_bytes: Option<u64> = None;
    let mut available_bytes: Option<u64> = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("MemTotal:") {
            total_bytes = Some(kb_field_bytes("MemTotal", v)?);
        } else if let Some(v) = line.strip_prefix("MemAvailable:") {
            available_bytes = Some(kb_field_bytes("MemAvailable", v)?);
        }

        if total_bytes.is_some() && available_bytes.is_some() {
            break;
        }
    }

    match (total_bytes, available_bytes) {
        (Some(total_bytes), Some(available_bytes)) => Ok(MemoryStatus {
            total_bytes,
            available_bytes,
        }),
        _ => Err(SourceError::Parse {
            what: "/proc/meminfo",
            detail: "MemTotal or MemAvailable missing".to_string(),
        }),
    }
}
