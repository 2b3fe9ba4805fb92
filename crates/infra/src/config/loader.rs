//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the API key is not in the environment, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `NIMBUS_QWEATHER_API_KEY`: provider API key (required for env loading)
//! - `NIMBUS_QWEATHER_API_HOST`: provider host
//! - `NIMBUS_DEFAULT_LOCATION`: location used when a query names none
//! - `NIMBUS_LANG`: provider response language
//! - `NIMBUS_WEATHER_CACHE_TTL`: weather entry lifetime in seconds
//! - `NIMBUS_CITY_CACHE_TTL`: city entry lifetime in seconds
//! - `NIMBUS_MAX_CACHE_SIZE`: entry limit per cache
//! - `NIMBUS_CLEANUP_INTERVAL`: expired-entry sweep period in seconds
//! - `NIMBUS_ENABLE_ASYNC_REFRESH`: refresh-ahead on/off (true/false)
//! - `NIMBUS_ENABLE_STATS`: statistics counters on/off (true/false)
//! - `NIMBUS_REFRESH_THRESHOLD`: TTL fraction after which refresh-ahead kicks in
//! - `NIMBUS_REFRESH_SCAN_INTERVAL`: refresh-ahead scan period in seconds
//! - `NIMBUS_FETCH_TIMEOUT`: upper bound on one upstream fetch in seconds
//! - `NIMBUS_LOG_LEVEL`: default log filter
//! - `NIMBUS_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./nimbus.json` or `./nimbus.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location
//!
//! A file may leave `provider.api_key` empty and supply it through
//! `NIMBUS_QWEATHER_API_KEY` instead.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use nimbus_domain::{
    CachePoolConfig, Config, LoggingConfig, NimbusError, ProviderConfig, Result,
};

const API_KEY_VAR: &str = "NIMBUS_QWEATHER_API_KEY";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the API key is
/// missing from the environment, falls back to loading from a config file.
///
/// # Errors
/// Returns `NimbusError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the API key is required; every other setting falls back to its
/// default.
///
/// # Errors
/// Returns `NimbusError::Config` if the API key is missing, a variable has an
/// unparsable value, or the result fails validation.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();
    let cache = defaults.cache;
    let provider = defaults.provider;
    let logging = defaults.logging;

    let config = Config {
        cache: CachePoolConfig {
            weather_cache_ttl: env_parse("NIMBUS_WEATHER_CACHE_TTL", cache.weather_cache_ttl)?,
            city_cache_ttl: env_parse("NIMBUS_CITY_CACHE_TTL", cache.city_cache_ttl)?,
            max_cache_size: env_parse("NIMBUS_MAX_CACHE_SIZE", cache.max_cache_size)?,
            enable_async_refresh: env_bool(
                "NIMBUS_ENABLE_ASYNC_REFRESH",
                cache.enable_async_refresh,
            ),
            cleanup_interval: env_parse("NIMBUS_CLEANUP_INTERVAL", cache.cleanup_interval)?,
            enable_stats: env_bool("NIMBUS_ENABLE_STATS", cache.enable_stats),
            refresh_threshold: env_parse("NIMBUS_REFRESH_THRESHOLD", cache.refresh_threshold)?,
            refresh_scan_interval: env_parse(
                "NIMBUS_REFRESH_SCAN_INTERVAL",
                cache.refresh_scan_interval,
            )?,
            fetch_timeout: env_parse("NIMBUS_FETCH_TIMEOUT", cache.fetch_timeout)?,
        },
        provider: ProviderConfig {
            api_key: env_var(API_KEY_VAR)?,
            api_host: env_or("NIMBUS_QWEATHER_API_HOST", provider.api_host),
            default_location: env_or("NIMBUS_DEFAULT_LOCATION", provider.default_location),
            lang: env_or("NIMBUS_LANG", provider.lang),
            ..provider
        },
        logging: LoggingConfig {
            level: env_or("NIMBUS_LOG_LEVEL", logging.level),
            json: env_bool("NIMBUS_LOG_JSON", logging.json),
        },
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `NimbusError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NimbusError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            NimbusError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NimbusError::Config(format!("Failed to read config file: {e}")))?;

    let mut config = parse_config(&contents, &config_path)?;
    if config.provider.api_key.is_empty() {
        if let Ok(key) = std::env::var(API_KEY_VAR) {
            config.provider.api_key = key;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NimbusError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NimbusError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(NimbusError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("nimbus.json"),
        dir.join("nimbus.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `NimbusError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| NimbusError::Config(format!("Missing required environment variable: {key}")))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty()).unwrap_or(default)
}

/// Parse an optional environment variable, falling back to `default`
///
/// # Errors
/// Returns `NimbusError::Config` when the variable is set but unparsable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| NimbusError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
