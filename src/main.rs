//! herakles-load-monitor - version 0.1.0
//!
//! Process load monitor with tracing logging.
//! This is the main entry point that starts the sampling loop, serves the
//! HTTP API and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod metrics;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, ValueEnum};
use herakles_load_monitor::Measurement;
use prometheus::{Gauge, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_generate_testdata, command_test};
use config::{
    build_process_source, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{
    config_handler, get_tag_handler, health_handler, measurements_handler, metrics_handler,
    min_max_mem_handler, plot_handler, process_handler, processes_handler, ram_handler,
    root_handler, set_tag_handler, tags_handler,
};
use metrics::MonitorMetrics;
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
///
/// The CLI flag wins over `log_level` in the config file.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = args
        .log_level
        .clone()
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s, true).ok())
        })
        .unwrap_or(LogLevel::Info);

    let filter = match log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Builds the router for all enabled endpoints.
fn build_router(state: SharedState, config: &Config) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/processes", get(processes_handler))
        .route("/processes/{uid}", get(process_handler))
        .route("/ram", get(ram_handler))
        .route("/measurements", get(measurements_handler))
        .route("/minmaxmem", get(min_max_mem_handler))
        .route("/plot", get(plot_handler))
        .route("/tag/{name}", post(set_tag_handler).get(get_tag_handler))
        .route("/tags", get(tags_handler))
        .route("/config", get(config_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    if config.enable_telemetry.unwrap_or(true) {
        app = app.route("/metrics", get(metrics_handler));
    } else {
        debug!("Telemetry disabled, /metrics not served");
    }

    app.with_state(state)
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        // Writing a template or test data needs no valid configuration
        match command {
            Commands::Config {
                output,
                format,
                commented,
            } => return command_config(output.clone(), format.clone(), *commented),
            Commands::GenerateTestdata { output, count } => {
                return command_generate_testdata(output.clone(), *count)
            }
            _ => {}
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);

        return match command {
            Commands::Check { memory, proc, all } => command_check(*memory, *proc, *all, &config),
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose, &config),
            Commands::Config { .. } | Commands::GenerateTestdata { .. } => Ok(()),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config, &args);

    info!("Starting herakles-load-monitor");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let settings = config.measurement_settings();
    let measurement = Arc::new(Measurement::new(settings, build_process_source(&config)?)?);
    info!(
        "Fast log: {} rows every {} ms, slow log: {} rows every {} samples",
        settings.fast_log_size,
        settings.fast_log_time_ms,
        settings.slow_log_size,
        settings.slow_log_factor
    );

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    debug!("Prometheus registry initialized");

    let metrics = MonitorMetrics::new(&registry)?;
    let scrape_duration = Gauge::new(
        "herakles_load_monitor_scrape_duration_seconds",
        "Time spent serving /metrics request",
    )?;
    registry.register(Box::new(scrape_duration.clone()))?;

    debug!("All metrics registered successfully");

    let state = Arc::new(AppState {
        measurement: Arc::clone(&measurement),
        registry,
        metrics,
        scrape_duration,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    measurement.start();

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;
    let app = build_router(state, &config);

    let enable_tls = config.enable_tls.unwrap_or(false);

    let served: Result<(), Box<dyn std::error::Error>> = if enable_tls {
        // Paths were checked by validate_effective_config()
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            return Err("TLS enabled without certificate and key paths".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!(
            "herakles-load-monitor listening on https://{}:{}",
            bind_ip_str, port
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => result.map_err(Into::into),
            _ = shutdown_signal() => Ok(()),
        }
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "herakles-load-monitor listening on http://{}:{}",
            bind_ip_str, port
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(Into::into)
    };

    measurement.stop().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("herakles-load-monitor stopped gracefully");
    Ok(())
}
