//! Finding and reading `token-fixer.toml`.
//!
//! An explicit `--config` path always wins. Otherwise the nearest
//! `token-fixer.toml` in the working directory or one of its ancestors is
//! used, and with no file anywhere the built-in defaults apply.

use crate::config::schema::{FixerConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for when no config path is given.
pub const CONFIG_FILE_NAME: &str = "token-fixer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read fixer config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixer config{}: {source}", located(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid fixer config{}: {source}", located(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

/// Where the active config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file was found; built-in defaults.
    Defaults,
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found by searching upward from the working directory.
    Discovered(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Defaults => None,
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => Some(path),
        }
    }
}

/// A validated config together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: FixerConfig,
    pub source: ConfigSource,
}

/// Parse and validate config text that did not come from a file.
pub fn load_from_str(input: &str) -> Result<FixerConfig, ConfigError> {
    parse(input, None)
}

/// Read, parse and validate a config file. Errors name the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FixerConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

fn parse(input: &str, path: Option<&Path>) -> Result<FixerConfig, ConfigError> {
    let path = path.map(Path::to_path_buf);
    let config: FixerConfig = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: path.clone(),
        source,
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path, source })?;
    Ok(config)
}

/// The nearest `token-fixer.toml` in `start` or any of its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Resolve the config for a run rooted at `cwd`.
pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedConfig, ConfigError> {
    let source = match explicit {
        Some(path) => ConfigSource::Explicit(path.to_path_buf()),
        None => match discover(cwd) {
            Some(path) => ConfigSource::Discovered(path),
            None => ConfigSource::Defaults,
        },
    };

    let config = match source.path() {
        Some(path) => load_from_path(path)?,
        None => FixerConfig::default(),
    };
    log::debug!("config source: {source:?}");
    Ok(LoadedConfig { config, source })
}
