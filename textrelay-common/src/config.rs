//! Configuration file discovery.
//!
//! Precedence:
//! 1. the path named by an environment variable (it must exist if set)
//! 2. the first existing path in a list of defaults

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} points to non-existent file: {}", path.display())]
    MissingEnvPath { var: String, path: PathBuf },

    #[error("No configuration file found. Tried:\n  - {var} environment variable\n{tried}")]
    NotFound { var: String, tried: String },

    #[error("Failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Locate a configuration file, reading `var` from the process environment.
pub fn find_config_file(var: &str, defaults: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    locate(var, std::env::var_os(var).map(PathBuf::from), defaults)
}

/// Locate a configuration file given an explicit environment value.
pub fn locate(
    var: &str,
    env_value: Option<PathBuf>,
    defaults: &[PathBuf],
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = env_value {
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::MissingEnvPath {
            var: var.to_string(),
            path,
        });
    }

    if let Some(path) = defaults.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let tried = defaults
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::NotFound {
        var: var.to_string(),
        tried,
    })
}

/// Read a located configuration file to a string.
pub fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
