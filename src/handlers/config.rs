//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the current monitor configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");

    let cfg = &state.config;
    let settings = state.measurement.settings();

    let mut out = String::new();

    writeln!(out, "HERAKLES LOAD MONITOR - CONFIGURATION").ok();
    writeln!(out, "=====================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                       {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                       {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "TLS/SSL CONFIGURATION").ok();
    writeln!(out, "---------------------").ok();
    writeln!(
        out,
        "enable_tls:                 {}",
        cfg.enable_tls.unwrap_or(false)
    )
    .ok();
    writeln!(
        out,
        "tls_cert_path:              {}",
        cfg.tls_cert_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(
        out,
        "tls_key_path:               {}",
        cfg.tls_key_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "MEASUREMENT").ok();
    writeln!(out, "-----------").ok();
    writeln!(out, "fast_log_size:              {}", settings.fast_log_size).ok();
    writeln!(out, "fast_log_time_ms:           {}", settings.fast_log_time_ms).ok();
    writeln!(out, "slow_log_size:              {}", settings.slow_log_size).ok();
    writeln!(out, "slow_log_factor:            {}", settings.slow_log_factor).ok();
    writeln!(
        out,
        "fast log span:              {} s",
        settings.fast_log_span().as_secs()
    )
    .ok();
    writeln!(
        out,
        "slow log span:              {} s",
        settings.slow_log_span().as_secs()
    )
    .ok();
    writeln!(
        out,
        "process source:             {}",
        cfg.test_data_file
            .as_ref()
            .map(|p| format!("test data ({})", p.display()))
            .unwrap_or_else(|| "/proc".to_string())
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "FEATURES").ok();
    writeln!(out, "--------").ok();
    writeln!(
        out,
        "enable_health:              {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "enable_telemetry:           {}",
        cfg.enable_telemetry.unwrap_or(true)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "{}", FOOTER_TEXT).ok();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}
