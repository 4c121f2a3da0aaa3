//! HTTP endpoint handlers for the monitor.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: HTML landing page
//! - `/processes`, `/processes/{uid}`, `/ram`: process and host memory data
//! - `/measurements`, `/minmaxmem`: windowed memory series
//! - `/plot`: HTML chart of a memory series
//! - `/tag/{name}`, `/tags`: named points in time
//! - `/health`: Health check endpoint
//! - `/config`: Configuration display endpoint
//! - `/metrics`: Prometheus metrics endpoint

pub mod config;
pub mod error;
pub mod health;
pub mod measurements;
pub mod metrics;
pub mod params;
pub mod plot;
pub mod processes;
pub mod root;
pub mod tags;

// Re-export handlers
pub use config::config_handler;
pub use health::health_handler;
pub use measurements::{measurements_handler, min_max_mem_handler};
pub use metrics::metrics_handler;
pub use plot::plot_handler;
pub use processes::{process_handler, processes_handler, ram_handler};
pub use root::root_handler;
pub use tags::{get_tag_handler, set_tag_handler, tags_handler};
