//! Configuration file management for certexpiry.
//!
//! A configuration file is only read when one is passed with `--config`.
//! Settings are layered with clear precedence:
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! targets = ["example.com", "example.com:8443"]
//! port = 443
//! timeout = 10
//! output = "summary"
//! exit_code = 1
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::host::validate_port;
use crate::output::OutputFormat;
use crate::{ExpiryError, Target, DEFAULT_PORT, DEFAULT_TIMEOUT};

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Targets as `host`, `host:port` or URL
    pub targets: Option<Vec<String>>,
    /// Port for targets that do not name one
    pub port: Option<i64>,
    /// Connect and handshake timeout in seconds
    pub timeout: Option<u64>,
    /// Output format: text, json, summary
    pub output: Option<OutputFormat>,
    /// Exit code to use when a check fails or a certificate has expired
    pub exit_code: Option<i32>,
}

impl Default for Config {
    /// - `targets`: None (must be provided)
    /// - `port`: 443
    /// - `timeout`: 10 seconds
    /// - `output`: text
    /// - `exit_code`: 0
    fn default() -> Self {
        Config {
            targets: None,
            port: Some(i64::from(DEFAULT_PORT)),
            timeout: Some(DEFAULT_TIMEOUT.as_secs()),
            output: Some(OutputFormat::Text),
            exit_code: Some(0),
        }
    }
}

impl Config {
    /// A configuration with every field unset, for merging.
    pub fn empty() -> Self {
        Config {
            targets: None,
            port: None,
            timeout: None,
            output: None,
            exit_code: None,
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - File could not be read
    /// * `ConfigError::Parse` - File contains invalid TOML
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use certexpiry::config::Config;
    /// let config = Config::from_file("certexpiry.toml")?;
    /// # Ok::<(), certexpiry::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, a `Some` in `other` overrides this config's value.
    ///
    /// ```
    /// # use certexpiry::config::Config;
    /// let file_config = Config::from_file("certexpiry.toml").unwrap_or_else(|_| Config::empty());
    /// let merged = Config::default().merge_with(file_config);
    /// assert!(merged.output.is_some());
    /// ```
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.targets.is_some() {
            self.targets = other.targets;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) override other layers.
    pub fn from_cli_args(
        port: Option<i64>,
        timeout: Option<u64>,
        output: Option<OutputFormat>,
        exit_code: Option<i32>,
    ) -> Self {
        Config {
            targets: None,
            port,
            timeout,
            output,
            exit_code,
        }
    }

    /// Checks values that TOML and clap cannot check by type alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an out-of-range port or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(port) = self.port {
            validate_port(port).map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::Validation(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the configured target strings into validated [`Target`]s.
    ///
    /// # Errors
    ///
    /// The first target that fails to parse, or an invalid default port.
    pub fn targets(&self) -> Result<Vec<Target>, ExpiryError> {
        let default_port = validate_port(self.port.unwrap_or_else(|| i64::from(DEFAULT_PORT)))?;
        self.targets
            .iter()
            .flatten()
            .map(|spec| Target::parse(spec, default_port))
            .collect()
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            targets: Some(vec![
                "example.com".to_string(),
                "example.com:8443".to_string(),
                "https://secure.example.com:9443".to_string(),
                "expired.badssl.com".to_string(),
            ]),
            port: Some(443),
            timeout: Some(10),
            output: Some(OutputFormat::Summary),
            exit_code: Some(1),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (invalid values)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
