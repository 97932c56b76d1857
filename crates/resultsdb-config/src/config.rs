// resultsdb-config/src/config.rs
// ============================================================================
// Module: ResultsDB Configuration
// Description: Configuration loading and validation for the ResultsDB client.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: resultsdb-core, serde, serde_json, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits
//! and validated before use. Every section is optional; omitted sections take
//! their defaults. The API token may be omitted from the file and supplied
//! through `RESULTSDB_TOKEN` instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use resultsdb_core::EventLevel;
use resultsdb_core::LocalZone;
use resultsdb_core::runtime::filters::check_scope;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "resultsdb.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RESULTSDB_CONFIG";
/// Environment variable supplying the API token.
pub const TOKEN_ENV_VAR: &str = "RESULTSDB_TOKEN";
/// Default account URL.
pub const DEFAULT_ACCOUNT_URL: &str = "https://api.quantum-computing.ibm.com";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of the account URL.
const MAX_URL_LENGTH: usize = 2048;
/// Maximum length of an API token.
const MAX_TOKEN_LENGTH: usize = 4096;
/// Maximum length of the user agent string.
const MAX_USER_AGENT_LENGTH: usize = 256;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 300_000;
/// Maximum allowed response size in bytes.
const MAX_RESPONSE_BYTES: usize = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// ResultsDB client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsDbConfig {
    /// Account and server selection.
    #[serde(default)]
    pub account: AccountConfig,
    /// HTTP transport limits.
    #[serde(default)]
    pub http: HttpConfig,
    /// Service behavior.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ResultsDbConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.account.validate()?;
        self.http.validate()?;
        self.service.validate()?;
        self.logging.validate()
    }
}

/// Account and server selection.
///
/// # Invariants
/// - `group` requires `hub`; `project` requires `group` and `hub`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountConfig {
    /// Base URL of the account server.
    #[serde(default = "default_account_url")]
    pub url: String,
    /// API token; `RESULTSDB_TOKEN` is used when absent.
    #[serde(default)]
    pub token: Option<String>,
    /// Hub used when creating experiments.
    #[serde(default)]
    pub hub: Option<String>,
    /// Group used when creating experiments.
    #[serde(default)]
    pub group: Option<String>,
    /// Project used when creating experiments.
    #[serde(default)]
    pub project: Option<String>,
    /// Verify TLS certificates.
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Use the in-process backend instead of the network.
    #[serde(default)]
    pub local: bool,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            url: default_account_url(),
            token: None,
            hub: None,
            group: None,
            project: None,
            verify: true,
            local: false,
        }
    }
}

impl AccountConfig {
    /// Returns the ResultsDB database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!("{}/resultsdb", self.url.trim().trim_end_matches('/'))
    }

    /// Returns the token login URL.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/v2/users/loginWithToken", self.url.trim().trim_end_matches('/'))
    }

    /// Returns the configured token, falling back to `RESULTSDB_TOKEN`.
    #[must_use]
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| env::var(TOKEN_ENV_VAR).ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Validates account settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("account.url must be non-empty".to_string()));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(ConfigError::Invalid("account.url exceeds max length".to_string()));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid("account.url must be an http(s) url".to_string()));
        }
        if let Some(token) = &self.token {
            if token.len() > MAX_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("account.token exceeds max length".to_string()));
            }
            if token.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "account.token must not contain whitespace".to_string(),
                ));
            }
        }
        check_scope(self.hub.as_deref(), self.group.as_deref(), self.project.as_deref())
            .map_err(|err| ConfigError::Invalid(format!("account: {err}")))
    }
}

/// HTTP transport limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates transport limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "http.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES}"
            )));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() || agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "http.user_agent must be 1 to {MAX_USER_AGENT_LENGTH} bytes"
            )));
        }
        Ok(())
    }
}

/// Service behavior settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Require confirmation before deletes.
    #[serde(default = "default_true")]
    pub prompt_for_delete: bool,
    /// Fixed `±HH:MM` local offset; the process offset when absent.
    #[serde(default)]
    pub utc_offset: Option<String>,
    /// Account preferences handed to callers unchanged.
    #[serde(default = "default_preferences")]
    pub preferences: toml::Table,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            prompt_for_delete: true,
            utc_offset: None,
            preferences: default_preferences(),
        }
    }
}

impl ServiceConfig {
    /// Returns the local zone for caller-facing timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `utc_offset` is malformed.
    pub fn zone(&self) -> Result<LocalZone, ConfigError> {
        match &self.utc_offset {
            Some(offset) => LocalZone::parse_offset(offset)
                .map_err(|err| ConfigError::Invalid(format!("service.utc_offset: {err}"))),
            None => Ok(LocalZone::system()),
        }
    }

    /// Returns the preferences as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the table cannot be represented
    /// as JSON.
    pub fn preferences_json(&self) -> Result<Map<String, Value>, ConfigError> {
        match serde_json::to_value(&self.preferences) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ConfigError::Invalid("service.preferences must be a table".to_string())),
            Err(err) => Err(ConfigError::Invalid(format!("service.preferences: {err}"))),
        }
    }

    /// Validates service settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.zone()?;
        self.preferences_json()?;
        Ok(())
    }
}

/// Event logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Minimum event level; `RESULTSDB_LOG_LEVEL` when absent.
    #[serde(default)]
    pub level: Option<String>,
    /// Log file; `RESULTSDB_LOG_FILE` when absent, stderr otherwise.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level
            && EventLevel::parse(level).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of debug, info, warning, error, critical; got \
                 \"{level}\""
            )));
        }
        if let Some(file) = &self.file {
            validate_path_string("logging.file", &file.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading, validation, or construction errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration or opening the log file.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The HTTP client could not be created or the login failed.
    #[error("client setup failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default account URL.
fn default_account_url() -> String {
    DEFAULT_ACCOUNT_URL.to_string()
}

/// Default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    30_000
}

/// Default response size cap.
const fn default_max_response_bytes() -> usize {
    32 * 1024 * 1024
}

/// Default user agent.
fn default_user_agent() -> String {
    "resultsdb-client/0.1".to_string()
}

/// Default preferences: automatic saving off.
fn default_preferences() -> toml::Table {
    let mut preferences = toml::Table::new();
    preferences.insert("auto_save".to_string(), toml::Value::Boolean(false));
    preferences
}
