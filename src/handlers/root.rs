//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays the monitor
//! status and a list of all available endpoints.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::{format_uptime, FOOTER_TEXT};
use crate::state::SharedState;

/// Endpoints listed on the landing page.
const ENDPOINTS: [(&str, &str); 9] = [
    ("/processes", "All tracked processes (JSON). Select with <code>uids=1,2</code> or <code>match=text</code>"),
    ("/ram", "Physical memory of the host (JSON)"),
    ("/measurements", "Memory series, windowed with <code>from</code>/<code>to</code> (RFC 3339) or <code>fromTag</code>/<code>toTag</code>"),
    ("/plot", "Memory chart of the selected processes, same parameters as <code>/measurements</code>"),
    ("/minmaxmem", "Highest and lowest memory per process inside the window (JSON)"),
    ("/tags", "All tags (JSON). Set one with <code>POST /tag/&lt;name&gt;</code>"),
    ("/health", "Sampler health and log fill levels (text)"),
    ("/config", "Active runtime configuration (text)"),
    ("/metrics", "Prometheus-compatible metrics endpoint"),
];

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");
    let built = env!("VERGEN_BUILD_TIMESTAMP");
    let uptime_str = format_uptime(state.start_time.elapsed().as_secs());
    let status = state.measurement.log_status();

    let mut endpoints = String::new();
    for (path, desc) in ENDPOINTS {
        writeln!(
            endpoints,
            "        <li>\n            <a href=\"{path}\">{path}</a>\n            <div class=\"endpoint-desc\">{desc}</div>\n        </li>"
        )
        .ok();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Herakles Load Monitor</title>
    <style>
        body {{ 
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; 
            margin: 0; 
            padding: 20px; 
            background: #f5f5f5; 
            line-height: 1.6;
        }}
        .container {{ 
            max-width: 900px; 
            margin: 0 auto; 
            background: white; 
            padding: 40px; 
            border-radius: 8px; 
            box-shadow: 0 2px 8px rgba(0,0,0,0.1); 
        }}
        h1 {{ 
            color: #333; 
            border-bottom: 3px solid #007bff; 
            padding-bottom: 15px; 
            margin-bottom: 10px;
        }}
        .subtitle {{
            color: #666;
            font-size: 1.1em;
            margin-bottom: 30px;
        }}
        h2 {{ 
            color: #555; 
            margin-top: 35px; 
            margin-bottom: 15px;
        }}
        .info {{ 
            background: #e9ecef; 
            padding: 15px; 
            border-radius: 4px; 
            margin: 20px 0;
            display: flex;
            justify-content: space-around;
            flex-wrap: wrap;
        }}
        .info-item {{
            margin: 10px;
        }}
        .info-label {{ 
            font-weight: 600; 
            color: #555; 
            display: block;
            font-size: 0.9em;
        }}
        .info-value {{ 
            font-size: 1.2em; 
            color: #007bff; 
        }}
        .endpoint-list {{
            list-style: none;
            padding: 0;
        }}
        .endpoint-list li {{
            margin: 20px 0;
            padding: 15px;
            background: #f8f9fa;
            border-left: 4px solid #007bff;
            border-radius: 4px;
        }}
        .endpoint-list a {{
            color: #007bff;
            text-decoration: none;
            font-weight: 600;
            font-size: 1.1em;
        }}
        .endpoint-list a:hover {{
            text-decoration: underline;
        }}
        .endpoint-desc {{
            color: #666;
            margin-top: 5px;
        }}
        .footer {{ 
            margin-top: 40px; 
            padding-top: 20px; 
            border-top: 1px solid #ddd; 
            color: #666; 
            font-size: 0.9em; 
            text-align: center;
        }}
        code {{
            background: #e9ecef;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: 'Courier New', monospace;
        }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Load Monitor</h1>
    <p class="subtitle">Per-process memory history at two resolutions</p>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Version</span>
            <span class="info-value">{version}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Built</span>
            <span class="info-value">{built}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Uptime</span>
            <span class="info-value">{uptime}</span>
        </div>
    </div>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Processes (alive / tracked)</span>
            <span class="info-value">{alive} / {tracked}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Fast log</span>
            <span class="info-value">{fast_rows} / {fast_cap} ({fast_pct}%)</span>
        </div>
        <div class="info-item">
            <span class="info-label">Slow log</span>
            <span class="info-value">{slow_rows} / {slow_cap} ({slow_pct}%)</span>
        </div>
    </div>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
{endpoints}    </ul>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        version = version,
        built = built,
        uptime = uptime_str,
        alive = status.alive,
        tracked = status.tracked,
        fast_rows = status.fast.rows,
        fast_cap = status.fast.capacity,
        fast_pct = status.fast.utilization_percent,
        slow_rows = status.slow.rows,
        slow_cap = status.slow.capacity,
        slow_pct = status.slow.utilization_percent,
        endpoints = endpoints,
        footer = FOOTER_TEXT
    );

    Html(html)
}
