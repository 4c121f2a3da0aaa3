//! Health check endpoint handler.
//!
//! The monitor is healthy once the sampling loop has written at least one row.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_load_monitor::{LogStatus, LoggerStats};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-load-monitor — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// Formats an uptime in minutes, hours or days.
pub fn format_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let status = state.measurement.log_status();
    let running = state.measurement.is_running();

    let (code, message) = if status.fast.rows == 0 {
        (StatusCode::SERVICE_UNAVAILABLE, "No samples yet")
    } else if !running {
        (StatusCode::OK, "OK - Sampling stopped")
    } else {
        (StatusCode::OK, "OK")
    };

    let uptime_str = format_uptime(state.start_time.elapsed().as_secs());
    let table = render_status(&status);

    debug!("Health check: {} - {}", code, message);
    (
        code,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}\n{FOOTER_TEXT}"),
    )
}

/// Renders the log and process status as a plain-text table.
pub fn render_status(status: &LogStatus) -> String {
    let mut out = String::new();
    writeln!(out, "LOGS").ok();
    writeln!(out, "====").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "{:<6} {:>8} {:>8} {:>6}  {:<25} {:<25}",
        "LOG", "ROWS", "CAPACITY", "USED", "OLDEST", "NEWEST"
    )
    .ok();
    render_log_line(&mut out, "fast", &status.fast);
    render_log_line(&mut out, "slow", &status.slow);
    writeln!(out).ok();

    writeln!(out, "PROCESSES").ok();
    writeln!(out, "=========").ok();
    writeln!(out).ok();
    writeln!(out, "tracked:              {}", status.tracked).ok();
    writeln!(out, "alive:                {}", status.alive).ok();
    writeln!(
        out,
        "last update:          {}",
        status
            .last_update
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    )
    .ok();
    if let Some(d) = status.last_cycle_duration {
        writeln!(out, "last cycle:           {:.3} ms", d.as_secs_f64() * 1000.0).ok();
    }
    out
}

fn render_log_line(out: &mut String, name: &str, stats: &LoggerStats) {
    let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    writeln!(
        out,
        "{:<6} {:>8} {:>8} {:>5}%  {:<25} {:<25}",
        name,
        stats.rows,
        stats.capacity,
        stats.utilization_percent,
        time(stats.oldest),
        time(stats.newest)
    )
    .ok();
}
