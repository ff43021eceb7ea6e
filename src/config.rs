//! Configuration for spies and proxy registries.
//!
//! Sources, lowest precedence first:
//! 1. [`SpyglassConfig::default`]
//! 2. A TOML file (feature `config-file`)
//! 3. `SPYGLASS_*` environment variables
//! 4. Programmatic overrides
//!
//! ```toml
//! clock = "logical"
//! render_limit = 20
//! ```
//!
//! Environment and override keys are `SPYGLASS_CLOCK` (`monotonic` or
//! `logical`) and `SPYGLASS_RENDER_LIMIT` (a positive integer).

use crate::clock::ClockKind;
use crate::error::{Error, ErrorKind};
use crate::reflector::DEFAULT_RENDER_LIMIT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "SPYGLASS_";
const KEY_CLOCK: &str = "SPYGLASS_CLOCK";
const KEY_RENDER_LIMIT: &str = "SPYGLASS_RENDER_LIMIT";

/// Settings applied to spies and proxy registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpyglassConfig {
    /// Clock used to timestamp invocation records.
    pub clock: ClockKind,
    /// Number of records rendered in reflector descriptions.
    pub render_limit: usize,
}

impl Default for SpyglassConfig {
    fn default() -> Self {
        Self {
            clock: ClockKind::Monotonic,
            render_limit: DEFAULT_RENDER_LIMIT,
        }
    }
}

impl SpyglassConfig {
    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render_limit == 0 {
            return Err(ConfigError::InvalidRenderLimit);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading a configuration file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file or a value could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// `render_limit` must be positive.
    #[error("render_limit must be > 0")]
    InvalidRenderLimit,
    /// An override named an unknown key.
    #[error("invalid override: {0}")]
    InvalidOverride(String),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config)
            .with_message(err.to_string())
            .with_source(err)
    }
}

/// Configuration loader with layered sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file_path: Option<PathBuf>,
    overrides: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Creates a loader that starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a TOML file to load.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Adds a programmatic override (highest precedence).
    #[must_use]
    pub fn override_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<SpyglassConfig, ConfigError> {
        let env: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        self.load_with_env(&env)
    }

    pub(crate) fn load_with_env(
        &self,
        env: &BTreeMap<String, String>,
    ) -> Result<SpyglassConfig, ConfigError> {
        let mut config = match &self.file_path {
            Some(path) => load_from_file(path)?,
            None => SpyglassConfig::default(),
        };
        apply_overrides(&mut config, env)?;
        apply_overrides(&mut config, &self.overrides)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "config-file")]
fn load_from_file(path: &Path) -> Result<SpyglassConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))
}

#[cfg(not(feature = "config-file"))]
fn load_from_file(path: &Path) -> Result<SpyglassConfig, ConfigError> {
    Err(ConfigError::Parse(format!(
        "{}: config files require the `config-file` feature",
        path.display()
    )))
}

fn apply_overrides(
    config: &mut SpyglassConfig,
    overrides: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in overrides {
        apply_override(config, key, value)?;
    }
    Ok(())
}

fn apply_override(config: &mut SpyglassConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        KEY_CLOCK => {
            config.clock = value.parse().map_err(ConfigError::Parse)?;
        }
        KEY_RENDER_LIMIT => {
            config.render_limit = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("invalid usize for {key}: {value}")))?;
        }
        _ => return Err(ConfigError::InvalidOverride(key.to_owned())),
    }
    Ok(())
}
