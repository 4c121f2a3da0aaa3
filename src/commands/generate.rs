//! Generate testdata command implementation.
//!
//! Generates synthetic test data JSON files for the mock process source.

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;
use tracing::debug;

use herakles_load_monitor::{MockData, MockProcess, MockSource};

// Constants for byte conversions
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

/// Executables the generated processes pretend to be.
const EXECUTABLES: [&str; 10] = [
    "/usr/sbin/nginx",
    "/usr/lib/postgresql/16/bin/postgres",
    "/usr/bin/redis-server",
    "/usr/sbin/sshd",
    "/usr/bin/python3",
    "/usr/bin/java",
    "/usr/bin/node",
    "/usr/lib/systemd/systemd-journald",
    "/usr/sbin/cron",
    "/usr/bin/dockerd",
];

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(
    output: PathBuf,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(
        "Generating test data: count={}, output={}",
        count,
        output.display()
    );

    let data = generate_test_data(&mut rand::thread_rng(), count);
    let process_count = data.processes.len();
    MockSource::from_data(data).save(&output)?;

    println!(
        "✅ Generated test data: {} processes in {}",
        process_count,
        output.display()
    );

    Ok(())
}

/// Builds `count` random processes on a host with 8 to 64 GB of memory.
pub fn generate_test_data(rng: &mut impl Rng, count: u32) -> MockData {
    let total_physical_bytes = rng.gen_range(8..=64) * GB;
    // Available: 20-80% of total
    let available_ratio: f64 = rng.gen_range(0.20..0.80);
    let available_physical_bytes = (total_physical_bytes as f64 * available_ratio) as u64;

    let mut current_pid: u32 = 1000;
    let mut processes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        processes.push(generate_random_process(rng, current_pid));
        current_pid += rng.gen_range(1..20);
    }

    MockData {
        total_physical_bytes,
        available_physical_bytes,
        fail_memory_status: false,
        processes,
    }
}

/// Generates a random process with a realistic resident set size.
fn generate_random_process(rng: &mut impl Rng, pid: u32) -> MockProcess {
    let path = EXECUTABLES
        .choose(rng)
        .copied()
        .unwrap_or("/usr/bin/unknown")
        .to_string();

    // RSS: 1 MB - 2 GB
    let memory_usage = rng.gen_range(MB..2 * GB);

    MockProcess {
        pid,
        command_line: format!("{} --worker {}", path, pid),
        path,
        memory_usage,
        fail_path: false,
        fail_command_line: false,
        fail_memory_usage: false,
    }
}
