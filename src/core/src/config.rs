use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutoRunError, Result};
use crate::options::{parse_bool, PullPolicy};

/// Environment variable selecting the engine binary.
pub const ENV_ENGINE: &str = "AUTORUN_ENGINE";
/// Environment variable overriding the pull policy.
pub const ENV_PULL: &str = "AUTORUN_PULL";
/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "AUTORUN_LOG";
/// Enables content trust when true.
pub const ENV_CONTENT_TRUST: &str = "DOCKER_CONTENT_TRUST";
/// Daemon host, used to pick per-host proxy settings.
pub const ENV_DOCKER_HOST: &str = "DOCKER_HOST";
/// Engine client configuration directory.
pub const ENV_DOCKER_CONFIG: &str = "DOCKER_CONFIG";

/// Autorun configuration (`~/.autorun/config.yaml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRunConfig {
    /// Engine invocation
    pub engine: EngineConfig,

    /// Default pull policy
    pub pull: PullPolicy,

    /// Verify image signatures before running
    pub content_trust: bool,

    /// Engine client configuration directory (holds `config.json`)
    pub engine_config_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for AutoRunConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            pull: PullPolicy::Always,
            content_trust: false,
            engine_config_dir: None,
            log_level: LogLevel::Warn,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary name or path (`docker`, `podman`)
    pub binary: String,

    /// Daemon host (`unix:///var/run/docker.sock`)
    pub host: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            host: None,
        }
    }
}

impl AutoRunConfig {
    /// Default config location (`~/.autorun/config.yaml`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".autorun"))
            .unwrap_or_else(|| PathBuf::from(".autorun"))
            .join("config.yaml")
    }

    /// Load a config file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| {
            AutoRunError::Serialization(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })
    }

    /// Load from `path` (or the default location) and apply process
    /// environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load(&Self::default_path())?,
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(binary) = lookup(ENV_ENGINE) {
            self.engine.binary = binary;
        }
        if let Some(host) = lookup(ENV_DOCKER_HOST) {
            self.engine.host = Some(host);
        }
        if let Some(pull) = lookup(ENV_PULL) {
            self.pull = pull.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level.parse()?;
        }
        if let Some(trust) = lookup(ENV_CONTENT_TRUST) {
            match parse_bool(&trust) {
                Some(enabled) => self.content_trust = enabled,
                None => tracing::warn!(value = %trust, "Ignoring invalid {ENV_CONTENT_TRUST}"),
            }
        }
        if let Some(dir) = lookup(ENV_DOCKER_CONFIG) {
            self.engine_config_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Directory holding the engine client `config.json`.
    pub fn engine_config_dir(&self) -> PathBuf {
        self.engine_config_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".docker"))
                .unwrap_or_else(|| PathBuf::from(".docker"))
        })
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive usable with an env filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = AutoRunError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(AutoRunError::invalid_option(
                "log level",
                s,
                "expected trace, debug, info, warn or error",
            )),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
