//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is read once at startup:
//! 1. Command-line `--config <path>` (highest priority)
//! 2. `RANKSCOPE_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/rankscope/config.toml` on Linux)
//! 4. Compiled defaults (no file at all)
//!
//! A missing config file is not an error; the service starts on defaults and
//! environment overrides.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "RANKSCOPE_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub providers: ProviderKeys,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
            pipeline: PipelineConfig::default(),
            providers: ProviderKeys::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Cache backend selection and per-domain toggles
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// "file" or "redis"; a configured `redis_url` implies "redis"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Directory for the file backend
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_true")]
    pub scrape_enabled: bool,

    #[serde(default = "default_ttl_hours")]
    pub scrape_ttl_hours: u64,

    #[serde(default = "default_true")]
    pub serp_enabled: bool,

    #[serde(default = "default_ttl_hours")]
    pub serp_ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            dir: default_cache_dir(),
            redis_url: None,
            scrape_enabled: true,
            scrape_ttl_hours: default_ttl_hours(),
            serp_enabled: true,
            serp_ttl_hours: default_ttl_hours(),
        }
    }
}

/// Pipeline pacing and deadline
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Delay between consecutive page fetches
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Minimum spacing between competitor model calls
    #[serde(default = "default_model_call_spacing_ms")]
    pub model_call_spacing_ms: u64,

    /// Competitor analyses in flight at once
    #[serde(default = "default_competitor_concurrency")]
    pub competitor_concurrency: usize,

    /// Wall-clock budget for a whole analysis
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            model_call_spacing_ms: default_model_call_spacing_ms(),
            competitor_concurrency: default_competitor_concurrency(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

/// External provider credentials
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProviderKeys {
    #[serde(default)]
    pub serpapi_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub scrapingbee_api_key: Option<String>,
    #[serde(default)]
    pub use_scrapingbee: bool,
}

fn default_port() -> u16 {
    5740
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_backend() -> String {
    "file".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_true() -> bool {
    true
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_rate_limit_delay_ms() -> u64 {
    1000
}

fn default_model_call_spacing_ms() -> u64 {
    500
}

fn default_competitor_concurrency() -> usize {
    1
}

fn default_deadline_secs() -> u64 {
    300
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
}

/// Load configuration from an explicit file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_toml_config(&content)
}

/// Locate the config file following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("rankscope").join("config.toml"))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Resolve and load bootstrap configuration, falling back to defaults
///
/// An explicitly named file that cannot be read is an error; an absent
/// default-location file is not.
pub fn load_bootstrap_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_arg.is_some() || std::env::var(CONFIG_PATH_ENV).is_ok();

    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) if explicit => Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        _ => {
            warn!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Read a boolean toggle from the environment
///
/// Only the literal values `true`/`false` (any case) and `1`/`0` are honoured;
/// anything else leaves `current` unchanged.
pub fn env_flag(name: &str, current: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => {
                warn!(variable = name, value = %value, "Ignoring unrecognized boolean");
                current
            }
        },
        Err(_) => current,
    }
}

/// Read and parse a numeric setting from the environment
pub fn env_parse<T: FromStr>(name: &str, current: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(variable = name, value = %value, "Ignoring unparsable value");
                current
            }
        },
        Err(_) => current,
    }
}

/// Read a non-empty string setting from the environment
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
