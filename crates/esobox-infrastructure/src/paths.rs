//! Path management for esobox configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/esobox/            # Config directory (dirs::config_dir)
//! ├── config.toml              # Application configuration
//! ├── languages.toml           # Language catalog (optional)
//! └── code/                    # Legacy code references (optional)
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Config directory could not be determined.
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Unified path management for esobox.
pub struct EsoboxPaths;

impl EsoboxPaths {
    const APP_DIR: &'static str = "esobox";

    /// Returns the esobox configuration directory (e.g. `~/.config/esobox/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default location of the language catalog.
    pub fn languages_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("languages.toml"))
    }
}
