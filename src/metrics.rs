//! Prometheus metrics definitions for herakles-load-monitor.
//!
//! The monitor exposes its own state as gauges: host memory as last sampled,
//! tracked and alive process counts, fill levels of both logs and timing of
//! the sampling cycle. Per-process series are served as JSON, not here.

use herakles_load_monitor::{LogStatus, SystemMemory};
use prometheus::{Gauge, GaugeVec, Opts, Registry};

/// Collection of Prometheus gauges describing the monitor.
#[derive(Clone)]
pub struct MonitorMetrics {
    pub system_memory_used_kb: Gauge,
    pub system_memory_total_kb: Gauge,
    pub processes_tracked: Gauge,
    pub processes_alive: Gauge,
    pub log_rows: GaugeVec,     // labels: log
    pub log_capacity: GaugeVec, // labels: log
    pub sample_duration_seconds: Gauge,
}

impl MonitorMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let system_memory_used_kb = Gauge::new(
            "herakles_load_monitor_system_memory_used_kb",
            "Physical memory in use at the last sample in KB",
        )?;
        let system_memory_total_kb = Gauge::new(
            "herakles_load_monitor_system_memory_total_kb",
            "Total physical memory in KB",
        )?;
        let processes_tracked = Gauge::new(
            "herakles_load_monitor_processes_tracked",
            "Processes tracked, dead or alive",
        )?;
        let processes_alive = Gauge::new(
            "herakles_load_monitor_processes_alive",
            "Processes alive at the last sample",
        )?;
        let log_rows = GaugeVec::new(
            Opts::new("herakles_load_monitor_log_rows", "Rows held by a log"),
            &["log"],
        )?;
        let log_capacity = GaugeVec::new(
            Opts::new("herakles_load_monitor_log_capacity", "Row capacity of a log"),
            &["log"],
        )?;
        let sample_duration_seconds = Gauge::new(
            "herakles_load_monitor_sample_duration_seconds",
            "Duration of the last sampling cycle in seconds",
        )?;

        registry.register(Box::new(system_memory_used_kb.clone()))?;
        registry.register(Box::new(system_memory_total_kb.clone()))?;
        registry.register(Box::new(processes_tracked.clone()))?;
        registry.register(Box::new(processes_alive.clone()))?;
        registry.register(Box::new(log_rows.clone()))?;
        registry.register(Box::new(log_capacity.clone()))?;
        registry.register(Box::new(sample_duration_seconds.clone()))?;

        Ok(Self {
            system_memory_used_kb,
            system_memory_total_kb,
            processes_tracked,
            processes_alive,
            log_rows,
            log_capacity,
            sample_duration_seconds,
        })
    }

    /// Refreshes all gauges from a status snapshot.
    pub fn update(&self, status: &LogStatus, system: SystemMemory) {
        self.system_memory_used_kb.set(system.last_used as f64);
        self.system_memory_total_kb.set(system.total_physical as f64);
        self.processes_tracked.set(status.tracked as f64);
        self.processes_alive.set(status.alive as f64);

        for (label, stats) in [("fast", &status.fast), ("slow", &status.slow)] {
            self.log_rows.with_label_values(&[label]).set(stats.rows as f64);
            self.log_capacity
                .with_label_values(&[label])
                .set(stats.capacity as f64);
        }

        if let Some(d) = status.last_cycle_duration {
            self.sample_duration_seconds.set(d.as_secs_f64());
        }
    }
}
