//! Plot endpoint handler.
//!
//! `/plot` renders the memory series of the selected processes as an inline
//! SVG chart. Selection and window parameters are the same as for
//! `/measurements`, and so are the 400 responses.

use axum::{
    extract::{Query, State},
    response::Html,
};
use herakles_load_monitor::{ProcessMeasurements, ProcessRecord, Uid};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::error::ApiError;
use crate::handlers::health::FOOTER_TEXT;
use crate::handlers::measurements::series_request;
use crate::handlers::params::QueryPairs;
use crate::state::SharedState;

// Chart geometry in SVG user units
const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// Line colors, reused round-robin.
const PALETTE: [&str; 10] = [
    "#007bff", "#dc3545", "#28a745", "#fd7e14", "#6f42c1", "#20c997", "#e83e8c", "#17a2b8",
    "#ffc107", "#343a40",
];

/// Handler for the /plot endpoint.
#[instrument(skip(state))]
pub async fn plot_handler(
    State(state): State<SharedState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Html<String>, ApiError> {
    debug!("Processing /plot request");

    let (uids, (from, to)) = series_request(&state, &pairs)?;
    let series = state.measurement.query_measurements(&uids, from, to);
    let plotted: Vec<Uid> = series.memory.keys().copied().collect();
    let processes = state.measurement.list_processes(Some(&plotted));

    Ok(Html(render_plot(&series, &processes)))
}

/// Renders the full plot page.
pub fn render_plot(series: &ProcessMeasurements, processes: &BTreeMap<Uid, ProcessRecord>) -> String {
    let window = match (series.times.first(), series.times.last()) {
        (Some(first), Some(last)) => format!(
            "{} to {} ({} samples)",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%Y-%m-%d %H:%M:%S"),
            series.times.len()
        ),
        _ => "no samples".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Memory Plot - Herakles Load Monitor</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 1100px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        h1 {{ color: #333; border-bottom: 3px solid #007bff; padding-bottom: 10px; }}
        .subtitle {{ color: #666; margin-bottom: 20px; }}
        table {{ border-collapse: collapse; width: 100%; margin-top: 20px; }}
        th, td {{ text-align: left; padding: 6px 10px; border-bottom: 1px solid #ddd; }}
        th {{ background: #f8f9fa; }}
        .swatch {{ display: inline-block; width: 12px; height: 12px; border-radius: 2px; }}
        .footer {{ margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; font-size: 0.9em; text-align: center; }}
    </style>
</head>
<body>
<div class="container">
    <h1>Memory Plot</h1>
    <p class="subtitle">{window}</p>
    <div id="plotarea" style="width: 100%; overflow-x: auto;">
{chart}    </div>
{legend}    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        window = window,
        chart = render_chart(series),
        legend = render_legend(series, processes),
        footer = FOOTER_TEXT
    )
}

/// SVG line chart, one polyline per uid. Memory in KB on the y axis.
fn render_chart(series: &ProcessMeasurements) -> String {
    let mut out = String::new();

    let (Some(first), Some(last)) = (series.times.first(), series.times.last()) else {
        writeln!(out, "        <p>No measurements in the selected window.</p>").ok();
        return out;
    };

    let span_ms = (*last - *first).num_milliseconds().max(1) as f64;
    let max_kb = series
        .memory
        .values()
        .flat_map(|values| values.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_of = |i: usize| {
        let offset = (series.times[i] - *first).num_milliseconds() as f64;
        MARGIN_LEFT + offset / span_ms * plot_w
    };
    let y_of = |kb: u32| MARGIN_TOP + plot_h - kb as f64 / max_kb * plot_h;

    writeln!(
        out,
        "        <svg viewBox=\"0 0 {WIDTH} {HEIGHT}\" width=\"100%\" xmlns=\"http://www.w3.org/2000/svg\">"
    )
    .ok();
    writeln!(
        out,
        "            <rect x=\"{MARGIN_LEFT}\" y=\"{MARGIN_TOP}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"#f8f9fa\" stroke=\"#ddd\"/>"
    )
    .ok();

    // Axis labels
    writeln!(
        out,
        "            <text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-size=\"12\">{max} KB</text>",
        x = MARGIN_LEFT - 6.0,
        y = MARGIN_TOP + 12.0,
        max = max_kb as u64
    )
    .ok();
    writeln!(
        out,
        "            <text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-size=\"12\">0 KB</text>",
        x = MARGIN_LEFT - 6.0,
        y = MARGIN_TOP + plot_h
    )
    .ok();
    for (x, anchor, time) in [(MARGIN_LEFT, "start", first), (MARGIN_LEFT + plot_w, "end", last)] {
        writeln!(
            out,
            "            <text x=\"{x}\" y=\"{y}\" text-anchor=\"{anchor}\" font-size=\"12\">{t}</text>",
            y = HEIGHT - 12.0,
            t = time.format("%H:%M:%S")
        )
        .ok();
    }

    for (i, (uid, values)) in series.memory.iter().enumerate() {
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(j, kb)| format!("{:.1},{:.1}", x_of(j), y_of(*kb)))
            .collect();
        writeln!(
            out,
            "            <polyline data-uid=\"{uid}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{points}\"/>",
            color = PALETTE[i % PALETTE.len()],
            points = points.join(" ")
        )
        .ok();
    }

    writeln!(out, "        </svg>").ok();
    out
}

/// Table mapping line colors to processes.
fn render_legend(series: &ProcessMeasurements, processes: &BTreeMap<Uid, ProcessRecord>) -> String {
    let mut out = String::new();
    if series.memory.is_empty() {
        return out;
    }

    writeln!(out, "    <table>").ok();
    writeln!(
        out,
        "        <tr><th></th><th>UID</th><th>PID</th><th>Name</th><th>Path</th><th>Max in window</th><th>Alive</th></tr>"
    )
    .ok();
    for (i, (uid, values)) in series.memory.iter().enumerate() {
        let max_kb = values.iter().copied().max().unwrap_or(0);
        let (pid, name, path, alive) = match processes.get(uid) {
            Some(p) => (
                p.pid.to_string(),
                escape_html(&p.name),
                escape_html(&p.path),
                if p.is_alive { "yes" } else { "no" },
            ),
            None => ("-".to_string(), String::new(), String::new(), "-"),
        };
        writeln!(
            out,
            "        <tr><td><span class=\"swatch\" style=\"background: {color}\"></span></td><td>{uid}</td><td>{pid}</td><td>{name}</td><td>{path}</td><td>{max_kb} KB</td><td>{alive}</td></tr>",
            color = PALETTE[i % PALETTE.len()]
        )
        .ok();
    }
    writeln!(out, "    </table>").ok();
    out
}

/// Escapes text for HTML element content.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
