//! Reading `fixwright.toml`.
//!
//! Parse errors name the table they occurred in, validation reports every
//! issue at once, and both carry the file path once one is known.

use crate::config::schema::{EngineConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up by [`load_or_default`].
pub const CONFIG_FILE_NAME: &str = "fixwright.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read engine config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine config{}{}: {source}", origin(.path), table(.section))]
    Toml {
        path: Option<PathBuf>,
        /// Table the error falls in, `None` before the first header
        section: Option<String>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid engine config{}: {source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

fn table(section: &Option<String>) -> String {
    section
        .as_ref()
        .map(|s| format!(" in [{s}]"))
        .unwrap_or_default()
}

impl ConfigError {
    fn at(mut self, file: &Path) -> Self {
        match &mut self {
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.get_or_insert_with(|| file.to_path_buf());
            }
            ConfigError::Io { .. } => {}
        }
        self
    }
}

/// Name of the innermost table header preceding `offset`.
///
/// `[engine]` gives `engine`, `[[pattern_rules]]` gives `pattern_rules`.
fn section_at(input: &str, offset: usize) -> Option<String> {
    input
        .get(..offset)?
        .lines()
        .rev()
        .map(str::trim_start)
        .find(|line| line.starts_with('['))
        .and_then(|header| header.trim_start_matches('[').split(']').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

pub fn load_from_str(input: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml_edit::de::from_str(input).map_err(|source| {
        let section = source.span().and_then(|span| section_at(input, span.start));
        ConfigError::Toml {
            path: None,
            section,
            source,
        }
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}

/// Load `dir/fixwright.toml`, or the defaults when there is none.
pub fn load_or_default(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        tracing::debug!(dir = %dir.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }
    tracing::debug!(path = %path.display(), "loading config");
    load_from_path(&path)
}
