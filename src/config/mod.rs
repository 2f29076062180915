//! Configuration system (layered: code > env > config file > defaults).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HandoffError;

/// Global default config (lazy-initialized from file + env).
static DEFAULT_CONFIG: OnceLock<HandoffConfig> = OnceLock::new();

pub const BROKER_ENABLED_ENV: &str = "HANDOFF_BROKER_ENABLED";
pub const SKIP_BROKER_ENV: &str = "HANDOFF_SKIP_BROKER";
pub const COMPLETION_TIMEOUT_ENV: &str = "HANDOFF_COMPLETION_TIMEOUT_SECS";

const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 300;

/// Settings that decide whether and how token requests are delegated.
///
/// `broker_enabled` defaults to `false`: broker delegation stays off until
/// an integrator confirms the installed authenticator apps support it, and
/// then opts in explicitly. `skip_broker` is the per-application switch that
/// keeps an enabled broker out of the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandoffConfig {
    pub broker_enabled: bool,
    pub skip_broker: bool,
    /// Seconds to wait for an interactive completion; `0` waits forever.
    pub completion_timeout_secs: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            broker_enabled: false,
            skip_broker: false,
            completion_timeout_secs: DEFAULT_COMPLETION_TIMEOUT_SECS,
        }
    }
}

impl HandoffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broker_enabled(mut self, enabled: bool) -> Self {
        self.broker_enabled = enabled;
        self
    }

    pub fn with_skip_broker(mut self, skip: bool) -> Self {
        self.skip_broker = skip;
        self
    }

    /// Set the interactive completion deadline, `None` meaning unbounded.
    ///
    /// The deadline is kept in whole seconds: fractions are truncated and
    /// anything shorter than one second becomes one second.
    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout_secs = timeout.map(|d| d.as_secs().max(1)).unwrap_or(0);
        self
    }

    /// Deadline for an interactive completion, `None` meaning unbounded.
    pub fn completion_timeout(&self) -> Option<Duration> {
        (self.completion_timeout_secs > 0).then(|| Duration::from_secs(self.completion_timeout_secs))
    }

    /// Default config file path (~/.handoff/config.toml).
    pub fn default_path() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".handoff"))
            .unwrap_or_else(|| PathBuf::from(".handoff"))
            .join("config.toml")
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, HandoffError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file.
    ///
    /// Returns the defaults if the file does not exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, HandoffError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(HandoffError::Io(err)),
        };
        Self::from_toml_str(&raw).map_err(|err| {
            HandoffError::Configuration(format!("{}: {err}", path.display()))
        })
    }

    /// Overlay `HANDOFF_*` environment variables onto this config.
    pub fn apply_env(mut self) -> Result<Self, HandoffError> {
        if let Some(value) = env_bool(BROKER_ENABLED_ENV)? {
            self.broker_enabled = value;
        }
        if let Some(value) = env_bool(SKIP_BROKER_ENV)? {
            self.skip_broker = value;
        }
        if let Ok(raw) = std::env::var(COMPLETION_TIMEOUT_ENV) {
            self.completion_timeout_secs = raw.trim().parse().map_err(|_| {
                HandoffError::Configuration(format!(
                    "{COMPLETION_TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
        }
        Ok(self)
    }

    /// Defaults overlaid with environment variables (`.env` is loaded first).
    pub fn from_env() -> Result<Self, HandoffError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::new().apply_env()
    }

    /// Config file at `path` overlaid with environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HandoffError> {
        let _ = dotenvy::dotenv();
        Self::load_from_path(path)?.apply_env()
    }

    /// Get (or create) the global default config.
    ///
    /// Falls back to the defaults, with a warning, if the file or the
    /// environment is malformed.
    pub fn global() -> &'static HandoffConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::load(Self::default_path()).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "invalid handoff configuration, using defaults");
                Self::new()
            })
        })
    }
}

fn env_bool(var: &str) -> Result<Option<bool>, HandoffError> {
    match std::env::var(var) {
        Ok(raw) => parse_bool(&raw).map(Some).ok_or_else(|| {
            HandoffError::Configuration(format!("{var} must be a boolean, got {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
