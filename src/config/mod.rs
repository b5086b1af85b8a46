//! Configuration module for Song Uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation of the settings the service
//! cannot start without.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = env_var_pattern();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

fn env_var_pattern() -> regex_lite::Regex {
    // The pattern is a literal; failing to compile it is a programming error.
    regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}")
        .expect("env var pattern is valid")
}

/// True when a value still carries an unexpanded `${VAR}` placeholder
fn has_placeholder(value: &str) -> bool {
    env_var_pattern().is_match(value)
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Reject a required value that is empty or was never expanded
fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingValue(field.to_string()));
    }
    if has_placeholder(value) {
        return Err(ConfigError::MissingValue(format!(
            "{} (unresolved placeholder '{}')",
            field, value
        )));
    }
    Ok(())
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required configuration value: {0}")]
    MissingValue(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    ///
    /// Object-store identity, credentials and the metadata-store connection
    /// string are required; the process refuses to start without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("storage.bucket", &self.storage.bucket)?;
        require("storage.region", &self.storage.region)?;
        require("storage.access_key", &self.storage.access_key)?;
        require("storage.secret_key", &self.storage.secret_key)?;
        require("database.uri", &self.database.uri)?;
        require("database.database", &self.database.database)?;
        require("database.collection", &self.database.collection)?;

        if let Some(ref endpoint) = self.storage.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid storage endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        if let Some(ref base) = self.storage.public_base_url {
            if !is_valid_http_url(base) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid public_base_url '{}': must start with http:// or https://",
                    base
                )));
            }
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one allowed extension must be configured".into(),
            ));
        }

        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than zero".into(),
            ));
        }

        for origin in &self.cors.allowed_origins {
            if !is_valid_http_url(origin) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid CORS origin '{}': must start with http:// or https://",
                    origin
                )));
            }
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format '{}': must be 'json' or 'pretty'",
                    other
                )))
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
        }
    }
}

fn default_server_address() -> String {
    "0.0.0.0:5000".to_string()
}

/// Object storage configuration
///
/// # Example
///
/// ```yaml
/// storage:
///   bucket: "${S3_BUCKET_NAME}"
///   region: "${AWS_REGION:-us-east-1}"
///   access_key: "${AWS_ACCESS_KEY_ID}"
///   secret_key: "${AWS_SECRET_ACCESS_KEY}"
///   endpoint: "http://localhost:9000"  # Optional: MinIO / RustFS
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Base URL used to build public object URLs (CDN, custom domain)
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Use `<endpoint>/<bucket>/<key>` addressing. Defaults to true when an
    /// endpoint is configured.
    #[serde(default)]
    pub force_path_style: Option<bool>,
}

impl StorageConfig {
    /// Whether requests use path-style addressing
    pub fn path_style(&self) -> bool {
        self.force_path_style.unwrap_or(self.endpoint.is_some())
    }
}

/// Metadata store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string, or `memory://` for a process-local store
    pub uri: String,
    #[serde(default = "default_database_name")]
    pub database: String,
    #[serde(default = "default_collection_name")]
    pub collection: String,
}

fn default_database_name() -> String {
    "music".to_string()
}

fn default_collection_name() -> String {
    "songs".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["mp3".into(), "wav".into(), "ogg".into()]
}

fn default_max_file_size() -> u64 {
    52428800 // 50MB
}

/// Cross-origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

/// Log output configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}
