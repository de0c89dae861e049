//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `HC_*`
//! environment variables, and merging them with proper precedence rules.

use crate::error::HandleCheckError;
use crate::types::{CheckConfig, ErrorPolicy, MAX_WORKERS};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Worker count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Delay between requests, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_ms: Option<u64>,

    /// Report every result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Profile endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout (as string, e.g., "5s", "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Check longer names first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by_length: Option<bool>,

    /// Treat lookup failures as unavailable instead of aborting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_going: Option<bool>,
}

impl DefaultsConfig {
    /// Overlay these values onto a run configuration.
    ///
    /// Values are assumed validated; an unparsable timeout is skipped.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(sleep_ms) = self.sleep_ms {
            config = config.with_delay(Duration::from_millis(sleep_ms));
        }
        if let Some(verbose) = self.verbose {
            config = config.with_verbose(verbose);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(timeout) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_request_timeout(Duration::from_secs(timeout));
        }
        if let Some(sort) = self.sort_by_length {
            config = config.with_sort_by_length(sort);
        }
        if let Some(keep_going) = self.keep_going {
            config = config.with_error_policy(if keep_going {
                ErrorPolicy::TreatAsTaken
            } else {
                ErrorPolicy::Abort
            });
        }
        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug)]
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if the file is missing or unreadable, and
    /// `ConfigError` if it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HandleCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HandleCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HandleCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            HandleCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then the home directory file, then the current
    /// directory file; later files override earlier ones field by field.
    /// Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => {
                    if self.verbose {
                        tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                    }
                }
            }
        }

        merged_config
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./handle-check.toml", "./.handle-check.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".handle-check.toml", "handle-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("handle-check").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    workers: higher_defaults.workers.or(lower_defaults.workers),
                    sleep_ms: higher_defaults.sleep_ms.or(lower_defaults.sleep_ms),
                    verbose: higher_defaults.verbose.or(lower_defaults.verbose),
                    endpoint: higher_defaults.endpoint.or(lower_defaults.endpoint),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    sort_by_length: higher_defaults
                        .sort_by_length
                        .or(lower_defaults.sort_by_length),
                    keep_going: higher_defaults.keep_going.or(lower_defaults.keep_going),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), HandleCheckError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(workers) = defaults.workers {
            validate_workers(workers)?;
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_timeout_string(timeout_str).is_none() {
                return Err(HandleCheckError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )));
            }
        }

        if let Some(endpoint) = &defaults.endpoint {
            validate_endpoint(endpoint)?;
        }

        Ok(())
    }
}

/// Check that a worker count is within `1..=MAX_WORKERS`.
pub fn validate_workers(workers: usize) -> Result<(), HandleCheckError> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(HandleCheckError::config(format!(
            "Workers must be between 1 and {}",
            MAX_WORKERS
        )));
    }
    Ok(())
}

/// Check that an endpoint is an http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<(), HandleCheckError> {
    let endpoint = endpoint.trim();
    let host = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));

    match host {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
        _ => Err(HandleCheckError::config(format!(
            "Invalid endpoint '{}'. Use an http:// or https:// URL",
            endpoint
        ))),
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via HC_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub workers: Option<usize>,
    pub sleep_ms: Option<u64>,
    pub verbose: Option<bool>,
    pub endpoint: Option<String>,
    pub timeout: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay environment values onto a run configuration.
    pub fn apply_to(&self, config: CheckConfig) -> CheckConfig {
        DefaultsConfig {
            workers: self.workers,
            sleep_ms: self.sleep_ms,
            verbose: self.verbose,
            endpoint: self.endpoint.clone(),
            timeout: self.timeout.clone(),
            sort_by_length: None,
            keep_going: None,
        }
        .apply_to(config)
    }
}

/// Load configuration from environment variables.
///
/// Parses all HC_* environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an `EnvConfig` from any key lookup.
fn env_config_from<F: Fn(&str) -> Option<String>>(lookup: F) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // HC_WORKERS - worker count
    if let Some(val) = lookup("HC_WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(workers) if validate_workers(workers).is_ok() => {
                env_config.workers = Some(workers);
                tracing::debug!("Using HC_WORKERS={}", workers);
            }
            _ => tracing::warn!("Invalid HC_WORKERS='{}', must be 1-{}", val, MAX_WORKERS),
        }
    }

    // HC_SLEEP - delay in milliseconds
    if let Some(val) = lookup("HC_SLEEP") {
        match val.trim().parse::<u64>() {
            Ok(sleep_ms) => {
                env_config.sleep_ms = Some(sleep_ms);
                tracing::debug!("Using HC_SLEEP={}", sleep_ms);
            }
            Err(_) => tracing::warn!("Invalid HC_SLEEP='{}', use milliseconds", val),
        }
    }

    // HC_VERBOSE - report every result
    if let Some(val) = lookup("HC_VERBOSE") {
        match parse_bool(&val) {
            Some(verbose) => {
                env_config.verbose = Some(verbose);
                tracing::debug!("Using HC_VERBOSE={}", verbose);
            }
            None => tracing::warn!("Invalid HC_VERBOSE='{}', use true/false", val),
        }
    }

    // HC_ENDPOINT - profile endpoint
    if let Some(endpoint) = lookup("HC_ENDPOINT") {
        if validate_endpoint(&endpoint).is_ok() {
            tracing::debug!("Using HC_ENDPOINT={}", endpoint);
            env_config.endpoint = Some(endpoint);
        } else {
            tracing::warn!("Invalid HC_ENDPOINT='{}', use an http(s) URL", endpoint);
        }
    }

    // HC_TIMEOUT - request timeout
    if let Some(timeout_str) = lookup("HC_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            tracing::debug!("Using HC_TIMEOUT={}", timeout_str);
            env_config.timeout = Some(timeout_str);
        } else {
            tracing::warn!(
                "Invalid HC_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    // HC_CONFIG - explicit config file
    if let Some(config_path) = lookup("HC_CONFIG") {
        if !config_path.trim().is_empty() {
            tracing::debug!("Using HC_CONFIG={}", config_path);
            env_config.config = Some(config_path);
        }
    }

    env_config
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Returns `None` if parsing fails, the
/// value overflows, or the timeout is zero.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    // A zero timeout would fail every lookup
    (secs > 0).then_some(secs)
}
