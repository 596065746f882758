//! # Slashing Protection Configuration
//!
//! Local protection is always on. A remote protector is configured by giving
//! it an endpoint; without one the service runs local-only.
//!
//! ## TOML
//!
//! ```toml
//! [remote]
//! endpoint = "slasher.internal:4002"
//! tls_cert_path = "/etc/validator/slasher.pem"
//! max_recv_message_size = 10485760
//! retry_count = 5
//! retry_delay = "1s"
//! custom_headers = "authorization=Bearer abc,x-client=validator"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default gRPC receive limit (10 MiB).
pub const DEFAULT_MAX_RECV_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
/// Default retries for a transiently unavailable remote.
pub const DEFAULT_RETRY_COUNT: u32 = 5;
/// Default delay between retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Slashing protection service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Remote protector; `None` means local-only protection.
    pub remote: Option<RemoteProtectorConfig>,
}

/// Connection settings for a remote protector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProtectorConfig {
    /// `host:port` or `scheme://host[:port]`
    pub endpoint: String,
    /// PEM certificate for TLS; plaintext when absent
    pub tls_cert_path: Option<PathBuf>,
    pub max_recv_message_size: usize,
    /// Retries after an `Unavailable` answer
    pub retry_count: u32,
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// `key=value` pairs separated by commas
    pub custom_headers: String,
}

impl Default for RemoteProtectorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            tls_cert_path: None,
            max_recv_message_size: DEFAULT_MAX_RECV_MESSAGE_SIZE,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            custom_headers: String::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {message}")]
    Io { path: PathBuf, message: String },
    /// Config file is not valid TOML for this schema
    #[error("invalid config file: {0}")]
    Parse(String),
    /// Malformed remote endpoint
    #[error("invalid remote endpoint: {0:?}")]
    InvalidEndpoint(String),
    /// Malformed custom header entry
    #[error("invalid custom header: {0:?}")]
    InvalidHeader(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

impl ProtectionConfig {
    /// Local-only protection.
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Protection backed by a remote protector at `endpoint`.
    pub fn with_remote(endpoint: impl Into<String>) -> Self {
        Self {
            remote: Some(RemoteProtectorConfig {
                endpoint: endpoint.into(),
                ..RemoteProtectorConfig::default()
            }),
        }
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&raw)
    }

    /// Parse and validate TOML text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.drop_empty_remote();
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SLASHER_ENDPOINT`: remote protector endpoint (default: none, local-only)
    /// - `QC_SLASHER_TLS_CERT`: TLS certificate path (default: plaintext)
    /// - `QC_GRPC_MAX_RECV_MSG_SIZE`: receive limit in bytes (default: 10 MiB)
    /// - `QC_GRPC_RETRIES`: retries on unavailable (default: 5)
    /// - `QC_GRPC_RETRY_DELAY`: delay between retries, e.g. `500ms` (default: 1s)
    /// - `QC_GRPC_HEADERS`: `key=value,key2=value2` (default: none)
    ///
    /// Unparseable limits and delays are rejected with
    /// `ConfigError::InvalidLimit`; the result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build from a variable lookup using the `from_env` names.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = RemoteProtectorConfig::default();
        let set = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let max_recv_message_size = match set("QC_GRPC_MAX_RECV_MSG_SIZE") {
            Some(v) => parse_limit("QC_GRPC_MAX_RECV_MSG_SIZE", &v)?,
            None => defaults.max_recv_message_size,
        };
        let retry_count = match set("QC_GRPC_RETRIES") {
            Some(v) => parse_limit("QC_GRPC_RETRIES", &v)?,
            None => defaults.retry_count,
        };
        let retry_delay = match set("QC_GRPC_RETRY_DELAY") {
            Some(v) => humantime_serde::re::humantime::parse_duration(v.trim()).map_err(|e| {
                ConfigError::InvalidLimit(format!("QC_GRPC_RETRY_DELAY={v}: {e}"))
            })?,
            None => defaults.retry_delay,
        };

        let mut config = Self {
            remote: Some(RemoteProtectorConfig {
                endpoint: var("QC_SLASHER_ENDPOINT")
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                tls_cert_path: set("QC_SLASHER_TLS_CERT").map(PathBuf::from),
                max_recv_message_size,
                retry_count,
                retry_delay,
                custom_headers: var("QC_GRPC_HEADERS").unwrap_or_default(),
            }),
        };
        config.drop_empty_remote();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        validate_endpoint(&remote.endpoint)?;
        if remote.max_recv_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_recv_message_size cannot be 0".into(),
            ));
        }
        remote.headers()?;
        Ok(())
    }

    fn drop_empty_remote(&mut self) {
        if self
            .remote
            .as_ref()
            .is_some_and(|remote| remote.endpoint.is_empty())
        {
            self.remote = None;
        }
    }
}

impl RemoteProtectorConfig {
    /// Parsed custom headers, in the order given.
    pub fn headers(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.custom_headers
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() && !value.contains('=') => {
                    Ok((key.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(ConfigError::InvalidHeader(entry.to_string())),
            })
            .collect()
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint(endpoint.to_string());
    let authority = match endpoint.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() => rest,
        Some(_) => return Err(invalid()),
        None => endpoint,
    };
    let host = authority.split('/').next().unwrap_or_default();
    let host = match host.rsplit_once(':') {
        Some((name, port)) => {
            port.parse::<u16>().map_err(|_| invalid())?;
            name
        }
        None => host,
    };
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

fn parse_limit<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidLimit(format!("{name}={value}: {e}")))
}
