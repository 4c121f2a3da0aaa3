//! Configuration management for herakles-load-monitor.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats as well as
//! legacy `key=value` property files.

use crate::cli::{Args, ConfigFormat};
use herakles_load_monitor::measurement::{
    DEFAULT_FAST_LOG_SIZE, DEFAULT_FAST_LOG_TIME_MS, DEFAULT_SLOW_LOG_FACTOR,
    DEFAULT_SLOW_LOG_SIZE,
};
use herakles_load_monitor::{MeasurementSettings, MockSource, ProcessSource, ProcfsSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 12124;

/// Searched in order when no config file is given.
const DEFAULT_CONFIG_LOCATIONS: [&str; 7] = [
    "/etc/herakles/load-monitor.yaml",
    "/etc/herakles/load-monitor.yml",
    "/etc/herakles/load-monitor.json",
    "./herakles-load-monitor.yaml",
    "./herakles-load-monitor.yml",
    "./herakles-load-monitor.json",
    "./plm.config",
];

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Measurement
    #[serde(alias = "fast-log-size", alias = "fastLogSize")]
    pub fast_log_size: Option<usize>,
    #[serde(alias = "slow-log-size", alias = "slowLogSize")]
    pub slow_log_size: Option<usize>,
    #[serde(alias = "fast-log-time-ms", alias = "fastLogTimeMs")]
    pub fast_log_time_ms: Option<u64>,
    #[serde(alias = "slow-log-factor", alias = "slowLogFactor")]
    pub slow_log_factor: Option<u32>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            fast_log_size: Some(DEFAULT_FAST_LOG_SIZE),
            slow_log_size: Some(DEFAULT_SLOW_LOG_SIZE),
            fast_log_time_ms: Some(DEFAULT_FAST_LOG_TIME_MS),
            slow_log_factor: Some(DEFAULT_SLOW_LOG_FACTOR),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
            test_data_file: None,
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    /// Measurement settings with defaults for unset values.
    pub fn measurement_settings(&self) -> MeasurementSettings {
        MeasurementSettings {
            fast_log_size: self.fast_log_size.unwrap_or(DEFAULT_FAST_LOG_SIZE),
            slow_log_size: self.slow_log_size.unwrap_or(DEFAULT_SLOW_LOG_SIZE),
            fast_log_time_ms: self.fast_log_time_ms.unwrap_or(DEFAULT_FAST_LOG_TIME_MS),
            slow_log_factor: self.slow_log_factor.unwrap_or(DEFAULT_SLOW_LOG_FACTOR),
        }
    }
}

/// Builds the process source: the test data file if configured, /proc otherwise.
pub fn build_process_source(
    cfg: &Config,
) -> Result<Box<dyn ProcessSource>, Box<dyn std::error::Error>> {
    match &cfg.test_data_file {
        Some(file) => {
            let mock = MockSource::load(file)?;
            info!(
                "Using test data from file: {} ({} processes)",
                file.display(),
                mock.len()
            );
            Ok(Box::new(mock))
        }
        None => Ok(Box::new(ProcfsSource::new())),
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Zero sizes, periods and factors are rejected by the measurement core
    cfg.measurement_settings().validate()?;

    if cfg.port == Some(0) {
        return Err("port must not be 0".into());
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_tls_file(cert, "certificate")?;
                check_tls_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a PEM file exists, is readable and not empty.
fn check_tls_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    // Measurement settings
    if let Some(v) = args.fast_log_size {
        config.fast_log_size = Some(v);
    }
    if let Some(v) = args.slow_log_size {
        config.slow_log_size = Some(v);
    }
    if let Some(v) = args.fast_log_time_ms {
        config.fast_log_time_ms = Some(v);
    }
    if let Some(v) = args.slow_log_factor {
        config.slow_log_factor = Some(v);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // Test data file: CLI wins if provided
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|p| Path::new(p).exists())
        {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        Some("config") | Some("properties") => {
            let config = parse_properties(&content);
            info!("Loaded property configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Parses a legacy `key=value` property file.
///
/// Lines starting with `#` are comments. Unknown keys are ignored and values
/// that do not parse keep their defaults.
pub fn parse_properties(content: &str) -> Config {
    let mut config = Config::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!("Ignoring malformed config line: {}", line);
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "port" => set_parsed(&mut config.port, key, value),
            "fastLogTimeMs" => set_parsed(&mut config.fast_log_time_ms, key, value),
            "slowLogFactor" => set_parsed(&mut config.slow_log_factor, key, value),
            "fastLogSize" => set_parsed(&mut config.fast_log_size, key, value),
            "slowLogSize" => set_parsed(&mut config.slow_log_size, key, value),
            _ => warn!("Ignoring unknown config key: {}", key),
        }
    }

    config
}

fn set_parsed<T: FromStr>(field: &mut Option<T>, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *field = Some(v),
        Err(_) => warn!("Invalid value '{}' for {}, keeping default", value, key),
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_properties() {
        let content = "# plm settings\nport=8080\nfastLogTimeMs = 500\nslowLogFactor=abc\nbogus=1\nnot a pair\n";
        let config = parse_properties(content);
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.fast_log_time_ms, Some(500));
        assert_eq!(config.slow_log_factor, Some(DEFAULT_SLOW_LOG_FACTOR));
        assert_eq!(config.fast_log_size, Some(DEFAULT_FAST_LOG_SIZE));
    }

    #[test]
    fn test_load_yaml_with_aliases() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 9000\nfast-log-size: 60\nslowLogFactor: 4").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.fast_log_size, Some(60));
        assert_eq!(config.slow_log_factor, Some(4));

        let settings = config.measurement_settings();
        assert_eq!(settings.slow_log_size, DEFAULT_SLOW_LOG_SIZE);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            slow_log_factor: Some(0),
            ..Config::default()
        };
        let err = validate_effective_config(&config).unwrap_err();
        assert!(err.to_string().contains("slow_log_factor"));
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_tls() {
        let mut config = Config {
            enable_tls: Some(true),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        fs::write(&cert, "CERT").unwrap();
        fs::write(&key, "").unwrap();
        config.tls_cert_path = Some(cert.to_string_lossy().to_string());
        config.tls_key_path = Some(key.to_string_lossy().to_string());
        let err = validate_effective_config(&config).unwrap_err();
        assert!(err.to_string().contains("empty"));

        fs::write(&key, "KEY").unwrap();
        assert!(validate_effective_config(&config).is_ok());
    }

    #[test]
    fn test_render_config_formats() {
        let config = Config::default();
        let yaml = render_config(&config, ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("port: 12124"));
        let json = render_config(&config, ConfigFormat::Json).unwrap();
        assert!(json.contains("\"fast_log_size\": 1200"));
    }
}
