//! Configuration for Blueair cloud clients.
//!
//! TOML file + `BLUEAIR_`-prefixed environment variables, credential
//! resolution (env var preferred over plaintext config), and translation
//! into `blueair-api` / `blueair-core` config types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use blueair_api::{Credentials, TransportConfig};
use blueair_core::CoordinatorConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured (set username/password in the config file or BLUEAIR_USERNAME / BLUEAIR_PASSWORD)")]
    NoCredentials,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// Top-level configuration.
///
/// The password is kept out of logs by resolution into a `SecretString`;
/// prefer supplying it via `BLUEAIR_PASSWORD` over plaintext TOML.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Account username (email).
    pub username: Option<String>,

    /// Account password (plaintext -- prefer the env var).
    pub password: Option<String>,

    /// Cloud region code: "us" or "eu".
    #[serde(default = "default_region")]
    pub region: String,

    /// Seconds between scheduled polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound on a single poll cycle, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            region: default_region(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_region() -> String {
    "us".into()
}
fn default_poll_interval() -> u64 {
    60
}
fn default_poll_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Canonical config file path: `$HOME/.config/blueair/config.toml`.
pub fn config_path() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("blueair");
    p.push("config.toml");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from a specific file path, then the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BLUEAIR_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the given path.
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML at the canonical config path.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

// ── Resolution into api/core types ──────────────────────────────────

impl Config {
    /// Resolve account credentials.
    ///
    /// `BLUEAIR_PASSWORD` wins over a plaintext password in the file.
    /// An unknown region surfaces as a validation error before any
    /// network call.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = self
            .username
            .clone()
            .or_else(|| std::env::var("BLUEAIR_USERNAME").ok())
            .ok_or(ConfigError::NoCredentials)?;

        let password = std::env::var("BLUEAIR_PASSWORD")
            .ok()
            .or_else(|| self.password.clone())
            .map(SecretString::from)
            .ok_or(ConfigError::NoCredentials)?;

        Credentials::new(username, password, &self.region).map_err(|e| {
            ConfigError::Validation {
                field: "region".into(),
                reason: e.to_string(),
            }
        })
    }

    /// Per-device coordinator timing.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    /// HTTP transport settings.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
