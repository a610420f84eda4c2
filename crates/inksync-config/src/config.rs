// crates/inksync-config/src/config.rs
// ============================================================================
// Module: InkSync Configuration
// Description: Configuration loading and validation for the webhook service.
// Purpose: Provide strict, fail-closed env parsing with hard limits.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from `INKSYNC_*` environment variables with
//! strict limits. The loader reads the environment through an injectable
//! lookup so tests can exercise validation without mutating process state.
//! Invalid configuration fails closed before the server binds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable prefix shared by all InkSync settings.
pub const ENV_PREFIX: &str = "INKSYNC_";
/// Default bind address for the webhook server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
/// Default maximum webhook body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;
/// Maximum allowed webhook body size in bytes.
pub const MAX_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
/// Default SQLite busy timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum allowed SQLite busy timeout in milliseconds.
pub const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default email provider request timeout in milliseconds.
pub const DEFAULT_EMAIL_TIMEOUT_MS: u64 = 5_000;
/// Minimum email provider request timeout in milliseconds.
pub const MIN_EMAIL_TIMEOUT_MS: u64 = 100;
/// Maximum email provider request timeout in milliseconds.
pub const MAX_EMAIL_TIMEOUT_MS: u64 = 30_000;
/// Maximum length accepted for the email provider API key.
pub const MAX_EMAIL_API_KEY_LENGTH: usize = 512;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Webhook server configuration.
///
/// # Invariants
/// - `bind` parses as a socket address.
/// - `max_body_bytes` is non-zero and no more than [`MAX_MAX_BODY_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    pub bind: String,
    /// Maximum allowed webhook body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Store backend selection.
///
/// # Invariants
/// - Variants are stable for env parsing and audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-memory store (tests and local demos only).
    #[default]
    Memory,
    /// Durable SQLite store.
    Sqlite,
}

impl StoreBackend {
    /// Returns a stable label for the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

/// SQLite journal mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

/// SQLite sync mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

/// Store configuration.
///
/// # Invariants
/// - `path` is required when `backend` is [`StoreBackend::Sqlite`].
/// - `busy_timeout_ms` is no more than [`MAX_BUSY_TIMEOUT_MS`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend selection.
    pub backend: StoreBackend,
    /// SQLite database file path.
    pub path: Option<PathBuf>,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
    /// SQLite journal mode.
    pub journal_mode: JournalMode,
    /// SQLite sync mode.
    pub sync_mode: SyncMode,
}

/// Email notifier configuration.
///
/// # Invariants
/// - When `enabled`, `api_url`, `api_key`, and `from_address` are required.
/// - `api_url` must be `https://`, or `http://` to a loopback host.
/// - `timeout_ms` lies within the configured bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether outbound email is enabled.
    pub enabled: bool,
    /// Email provider endpoint URL.
    pub api_url: Option<String>,
    /// Bearer API key for the email provider.
    pub api_key: Option<String>,
    /// Sender address placed on outbound messages.
    pub from_address: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: None,
            api_key: None,
            from_address: None,
            timeout_ms: DEFAULT_EMAIL_TIMEOUT_MS,
        }
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines to standard error.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
}

impl AuditSinkKind {
    /// Returns a stable label for the sink.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::File => "file",
        }
    }
}

/// Audit logging configuration.
///
/// # Invariants
/// - `path` is required when `sink` is [`AuditSinkKind::File`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Audit sink selection.
    pub sink: AuditSinkKind,
    /// Audit log file path for the file sink.
    pub path: Option<PathBuf>,
}

/// Top-level InkSync configuration.
///
/// Constructed once at process start and passed explicitly into the
/// transport and notifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InkSyncConfig {
    /// Webhook server settings.
    pub server: ServerConfig,
    /// Store settings.
    pub store: StoreConfig,
    /// Email notifier settings.
    pub email: EmailConfig,
    /// Audit logging settings.
    pub audit: AuditConfig,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment value failed to parse.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// Parse failure description.
        message: String,
    },
    /// Validation rejected the assembled configuration.
    #[error("config validation failed: {0}")]
    Validation(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl InkSyncConfig {
    /// Loads and validates configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable fails to parse or validation
    /// rejects the assembled configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads and validates configuration through an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable fails to parse or validation
    /// rejects the assembled configuration.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            server: ServerConfig {
                bind: lookup("INKSYNC_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
                max_body_bytes: parse_or_default(
                    &lookup,
                    "INKSYNC_MAX_BODY_BYTES",
                    DEFAULT_MAX_BODY_BYTES,
                )?,
            },
            store: StoreConfig {
                backend: parse_keyword(&lookup, "INKSYNC_STORE", StoreBackend::Memory, &[
                    ("memory", StoreBackend::Memory),
                    ("sqlite", StoreBackend::Sqlite),
                ])?,
                path: lookup("INKSYNC_STORE_PATH").map(PathBuf::from),
                busy_timeout_ms: parse_optional(&lookup, "INKSYNC_STORE_BUSY_TIMEOUT_MS")?,
                journal_mode: parse_keyword(
                    &lookup,
                    "INKSYNC_STORE_JOURNAL_MODE",
                    JournalMode::Wal,
                    &[("wal", JournalMode::Wal), ("delete", JournalMode::Delete)],
                )?,
                sync_mode: parse_keyword(&lookup, "INKSYNC_STORE_SYNC_MODE", SyncMode::Full, &[
                    ("full", SyncMode::Full),
                    ("normal", SyncMode::Normal),
                ])?,
            },
            email: EmailConfig {
                enabled: parse_keyword(&lookup, "INKSYNC_EMAIL_ENABLED", false, &[
                    ("true", true),
                    ("false", false),
                ])?,
                api_url: lookup("INKSYNC_EMAIL_API_URL"),
                api_key: lookup("INKSYNC_EMAIL_API_KEY"),
                from_address: lookup("INKSYNC_EMAIL_FROM"),
                timeout_ms: parse_or_default(
                    &lookup,
                    "INKSYNC_EMAIL_TIMEOUT_MS",
                    DEFAULT_EMAIL_TIMEOUT_MS,
                )?,
            },
            audit: AuditConfig {
                sink: parse_keyword(&lookup, "INKSYNC_AUDIT_SINK", AuditSinkKind::Stderr, &[
                    ("stderr", AuditSinkKind::Stderr),
                    ("file", AuditSinkKind::File),
                ])?,
                path: lookup("INKSYNC_AUDIT_PATH").map(PathBuf::from),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first rejected
    /// setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<SocketAddr>().map_err(|_| {
            ConfigError::Validation(format!("invalid bind address: {}", self.server.bind))
        })?;
        if self.server.max_body_bytes == 0 || self.server.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Validation(format!(
                "max_body_bytes out of range: {} (max {MAX_MAX_BODY_BYTES})",
                self.server.max_body_bytes
            )));
        }
        self.validate_store()?;
        self.validate_email()?;
        if self.audit.sink == AuditSinkKind::File && self.audit.path.is_none() {
            return Err(ConfigError::Validation(
                "file audit sink requires INKSYNC_AUDIT_PATH".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates store settings.
    fn validate_store(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Sqlite && self.store.path.is_none() {
            return Err(ConfigError::Validation(
                "sqlite store requires INKSYNC_STORE_PATH".to_string(),
            ));
        }
        if let Some(timeout) = self.store.busy_timeout_ms
            && timeout > MAX_BUSY_TIMEOUT_MS
        {
            return Err(ConfigError::Validation(format!(
                "store busy timeout out of range: {timeout} (max {MAX_BUSY_TIMEOUT_MS})"
            )));
        }
        Ok(())
    }

    /// Validates email settings.
    fn validate_email(&self) -> Result<(), ConfigError> {
        if !self.email.enabled {
            return Ok(());
        }
        let url = self
            .email
            .api_url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("email requires INKSYNC_EMAIL_API_URL".to_string()))?;
        if !is_allowed_email_url(url) {
            return Err(ConfigError::Validation(
                "email api url must be https (http allowed for loopback only)".to_string(),
            ));
        }
        let key = self
            .email
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("email requires INKSYNC_EMAIL_API_KEY".to_string()))?;
        if key.is_empty() || key.len() > MAX_EMAIL_API_KEY_LENGTH {
            return Err(ConfigError::Validation(format!(
                "email api key length out of range (max {MAX_EMAIL_API_KEY_LENGTH})"
            )));
        }
        if self.email.from_address.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Validation(
                "email requires INKSYNC_EMAIL_FROM".to_string(),
            ));
        }
        if self.email.timeout_ms < MIN_EMAIL_TIMEOUT_MS || self.email.timeout_ms > MAX_EMAIL_TIMEOUT_MS
        {
            return Err(ConfigError::Validation(format!(
                "email timeout out of range: {} ({MIN_EMAIL_TIMEOUT_MS}..={MAX_EMAIL_TIMEOUT_MS})",
                self.email.timeout_ms
            )));
        }
        Ok(())
    }

    /// Returns a redacted summary safe for operator output.
    ///
    /// The email API key never appears in the summary.
    #[must_use]
    pub fn redacted_summary(&self) -> String {
        format!(
            "bind={} max_body_bytes={} store={} email_enabled={} audit={}",
            self.server.bind,
            self.server.max_body_bytes,
            self.store.backend.as_str(),
            self.email.enabled,
            self.audit.sink.as_str()
        )
    }
}

// ============================================================================
// SECTION: Parse Helpers
// ============================================================================

/// Parses a numeric environment value, falling back to a default.
fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    parse_optional(lookup, key).map(|value| value.unwrap_or(default))
}

/// Parses an optional numeric environment value.
fn parse_optional<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(key).map_or(Ok(None), |raw| {
        raw.trim().parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{raw}'"),
        })
    })
}

/// Parses a keyword environment value against an explicit table.
fn parse_keyword<T: Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    table: &[(&str, T)],
) -> Result<T, ConfigError> {
    lookup(key).map_or(Ok(default), |raw| {
        let normalized = raw.trim().to_ascii_lowercase();
        table
            .iter()
            .find(|(keyword, _)| *keyword == normalized)
            .map(|(_, value)| *value)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("unknown keyword '{raw}'"),
            })
    })
}

/// Returns true when the email provider URL satisfies transport policy.
fn is_allowed_email_url(url: &str) -> bool {
    if url.starts_with("https://") {
        return true;
    }
    url.strip_prefix("http://").is_some_and(|rest| {
        if rest.starts_with("[::1]") {
            return true;
        }
        let host = rest.split(['/', ':']).next().unwrap_or_default();
        host == "localhost" || host == "127.0.0.1"
    })
}
