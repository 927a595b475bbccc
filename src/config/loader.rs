//! Rule file loading. Errors carry the file path when there is one, so a
//! message about a broken rule file always says which file.

use crate::config::schema::{RuleSet, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read rule file from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rule file TOML{}: {source}", at(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid rule file{}: {source}", at(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn at(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

fn parse(input: &str, path: Option<&Path>) -> Result<RuleSet, ConfigError> {
    let config: RuleSet = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: path.map(Path::to_path_buf),
        source,
    })?;
    config.validate().map_err(|source| ConfigError::Validation {
        path: path.map(Path::to_path_buf),
        source,
    })?;
    Ok(config)
}
