//! Configuration
//!
//! Loaded from TOML; every section and field is optional and falls back to
//! the defaults below.
//!
//! ```toml
//! [retry]
//! timeout_ms = 10000
//! backoff = { kind = "fixed", delay_ms = 100 }
//! converge = 1
//!
//! [traffic]
//! send_count = 100
//! port_name = "http"
//! port = 80
//! expected_origin = "^b-.*$"
//!
//! [convergence]
//! mode = "fail-fast"
//! ```

use mcv_convergence::CheckMode;
use mcv_retry::RetryPolicy;
use mcv_traffic::{OriginMatcher, DEFAULT_PORT_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Requests per verification batch
pub const DEFAULT_SEND_COUNT: usize = 100;

/// Service port routes are expected on
pub const DEFAULT_PORT: u16 = 80;

/// Backends in the preferred locality are named `b-*`
pub const DEFAULT_EXPECTED_ORIGIN: &str = "^b-.*$";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McvConfig {
    pub retry: RetryPolicy,
    pub traffic: TrafficConfig,
    pub convergence: ConvergenceConfig,
}

impl McvConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With traffic settings
    #[inline]
    #[must_use]
    pub fn with_traffic(mut self, traffic: TrafficConfig) -> Self {
        self.traffic = traffic;
        self
    }

    /// With convergence reporting mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: CheckMode) -> Self {
        self.convergence.mode = mode;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns `ConfigError` if the text is not valid TOML for this shape or
    /// fails validation
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check values the type system cannot
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.traffic.send_count == 0 {
            return Err(ConfigError::invalid("traffic.send_count", "must be at least 1"));
        }
        if self.traffic.port_name.is_empty() {
            return Err(ConfigError::invalid("traffic.port_name", "must not be empty"));
        }
        if let Some(jitter) = &self.retry.jitter {
            if !(0.0..=1.0).contains(&jitter.ratio) {
                return Err(ConfigError::invalid(
                    "retry.jitter.ratio",
                    "must be a number between 0 and 1",
                ));
            }
        }
        self.traffic.origin_matcher()?;
        Ok(())
    }
}

/// Traffic batch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrafficConfig {
    pub send_count: usize,
    pub port_name: String,
    pub port: u16,
    /// Pattern every responding backend must contain
    pub expected_origin: String,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            send_count: DEFAULT_SEND_COUNT,
            port_name: DEFAULT_PORT_NAME.to_string(),
            port: DEFAULT_PORT,
            expected_origin: DEFAULT_EXPECTED_ORIGIN.to_string(),
        }
    }
}

impl TrafficConfig {
    /// Compile the expected-origin pattern
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the pattern does not compile
    pub fn origin_matcher(&self) -> Result<OriginMatcher, ConfigError> {
        OriginMatcher::new(&self.expected_origin)
            .map_err(|err| ConfigError::invalid("traffic.expected_origin", err.to_string()))
    }
}

/// Convergence settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvergenceConfig {
    pub mode: CheckMode,
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Text is not valid TOML for this shape
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
