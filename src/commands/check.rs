//! Check command implementation.
//!
//! Validates system requirements and configuration.

use std::path::Path;

use herakles_load_monitor::process::procfs::DEFAULT_PROC_ROOT;
use herakles_load_monitor::{ProcessSource, ProcfsSource};

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub fn command_check(
    memory: bool,
    proc: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Load Monitor - System Check");
    println!("=======================================");

    let mut all_ok = true;
    let source = ProcfsSource::new();

    // Check /proc filesystem
    if proc || all {
        println!("\n📁 Checking /proc filesystem...");
        if Path::new(DEFAULT_PROC_ROOT).exists() {
            println!("   ✅ /proc filesystem accessible");

            let pids = source.pids();
            if pids.is_empty() {
                println!("   ❌ Cannot read any process entries from /proc");
                all_ok = false;
            } else {
                let readable = pids.iter().filter(|pid| source.path(**pid).is_ok()).count();
                println!(
                    "   ✅ Found {} processes, executable path readable for {}",
                    pids.len(),
                    readable
                );
                if readable < pids.len() {
                    println!("   ⚠️  Processes with unreadable paths are not tracked (run as root to see all)");
                }
            }
        } else {
            println!("   ❌ /proc filesystem not found");
            all_ok = false;
        }
    }

    // Check memory accessibility
    if memory || all {
        println!("\n💾 Checking memory accessibility...");
        let own_pid = std::process::id();

        match source.memory_usage(own_pid) {
            Ok(bytes) => println!("   ✅ Own resident memory: {} KB", bytes / 1024),
            Err(e) => {
                println!("   ❌ Reading process memory failed: {}", e);
                all_ok = false;
            }
        }

        match source.memory_status() {
            Ok(status) => println!(
                "   ✅ System memory: {} MB total, {} MB available",
                status.total_bytes / 1024 / 1024,
                status.available_bytes / 1024 / 1024
            ),
            Err(e) => {
                println!("   ❌ Reading /proc/meminfo failed: {}", e);
                all_ok = false;
            }
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    if let Some(file) = &config.test_data_file {
        println!("\n🧪 Checking test data file...");
        match herakles_load_monitor::MockSource::load(file) {
            Ok(mock) => println!("   ✅ {} synthetic processes in {}", mock.len(), file.display()),
            Err(e) => {
                println!("   ❌ Cannot load {}: {}", file.display(), e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
