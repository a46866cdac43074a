//! Application configuration (`config.toml`).
//!
//! Every section and key is optional; missing values take the defaults
//! below. Launch parameters given on the command line override the file.

use crate::paths::EsoboxPaths;
use anyhow::{Context, Result, bail};
use esobox_core::codec::{DEFAULT_MAGIC, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EsoboxConfig {
    pub protocol: ProtocolConfig,
    pub export: ExportConfig,
    pub runtime: RuntimeConfig,
    pub paths: PathsConfig,
}

/// `[protocol]`: token namespace and versions.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Namespace written at the head of every token
    pub magic: String,
    /// Version used when building new tokens
    pub default_version: ProtocolVersion,
    /// Versions accepted when reading tokens
    pub supported_versions: Vec<ProtocolVersion>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            magic: DEFAULT_MAGIC.to_string(),
            default_version: ProtocolVersion::V1_0_0,
            supported_versions: ProtocolVersion::supported(),
        }
    }
}

/// `[export]`: shareable link formatting.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Render a wiki link instead of the markdown snippet
    pub wiki: bool,
    pub base_url: String,
    pub project: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            wiki: false,
            base_url: "http://localhost/esolangs".to_string(),
            project: "main".to_string(),
        }
    }
}

/// `[runtime]`: execution behaviour.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Offline mode: internal faults are not reported anywhere
    pub local: bool,
    /// Run the hello-world program right after loading it
    pub auto_run_hello_world: bool,
    /// Where internal faults are POSTed when not in local mode
    pub report_endpoint: Option<String>,
    /// Language of a blank session
    pub default_language: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            local: false,
            auto_run_hello_world: false,
            report_endpoint: None,
            default_language: "Text".to_string(),
        }
    }
}

/// `[paths]`: auxiliary files.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Language catalog; defaults to `languages.toml` in the config directory
    pub languages: Option<PathBuf>,
    /// Root the legacy `1.0.1` code references are resolved against
    pub legacy_code_root: Option<PathBuf>,
}

impl EsoboxConfig {
    /// Loads the configuration from `path`, or from the default location
    /// when `path` is `None`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match EsoboxPaths::config_file() {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("[Config] {}, using defaults", e);
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            tracing::debug!("[Config] {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;

        tracing::info!("[Config] Loaded {:?}", path);
        Ok(config)
    }

    /// Parses and validates a configuration document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let protocol = &self.protocol;
        if protocol.magic.is_empty() {
            bail!("protocol.magic must not be empty");
        }
        self.validate_export_version(protocol.default_version)?;
        if self.runtime.default_language.is_empty() {
            bail!("runtime.default_language must not be empty");
        }
        Ok(())
    }

    /// Checks that new tokens may be written with `version`.
    pub fn validate_export_version(&self, version: ProtocolVersion) -> Result<()> {
        if !self.protocol.supported_versions.contains(&version) {
            bail!(
                "version {} is not one of the supported versions ({})",
                version,
                self.protocol
                    .supported_versions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if version.is_legacy_code_reference() {
            bail!("version {} is read-only and cannot be used for new tokens", version);
        }
        Ok(())
    }

    /// Path of the language catalog file.
    pub fn languages_path(&self) -> Option<PathBuf> {
        self.paths
            .languages
            .clone()
            .or_else(|| EsoboxPaths::languages_file().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EsoboxConfig::from_toml("").unwrap();
        assert_eq!(config, EsoboxConfig::default());
        assert_eq!(config.protocol.magic, "esolangs");
        assert_eq!(config.protocol.default_version.to_string(), "1.0.0");
        assert_eq!(config.protocol.supported_versions.len(), 2);
        assert_eq!(config.runtime.default_language, "Text");
        assert!(!config.export.wiki);
    }

    #[test]
    fn test_partial_document() {
        let config = EsoboxConfig::from_toml(
            r#"
            [export]
            wiki = true
            base_url = "https://example.org/tio"

            [runtime]
            local = true
            "#,
        )
        .unwrap();
        assert!(config.export.wiki);
        assert_eq!(config.export.base_url, "https://example.org/tio");
        assert_eq!(config.export.project, "main");
        assert!(config.runtime.local);
        assert!(!config.runtime.auto_run_hello_world);
    }

    #[test]
    fn test_rejects_unsupported_default_version() {
        let err = EsoboxConfig::from_toml(
            r#"
            [protocol]
            default_version = "2.0.0"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not one of the supported"));
    }

    #[test]
    fn test_rejects_legacy_default_version() {
        let err = EsoboxConfig::from_toml(
            r#"
            [protocol]
            default_version = "1.0.1"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_rejects_malformed_version() {
        assert!(
            EsoboxConfig::from_toml(
                r#"
                [protocol]
                default_version = "one"
                "#,
            )
            .is_err()
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EsoboxConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, EsoboxConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[paths]\nlanguages = \"/srv/esobox/languages.toml\"\n",
        )
        .unwrap();
        let config = EsoboxConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.languages_path().unwrap(),
            PathBuf::from("/srv/esobox/languages.toml")
        );
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runtime\n").unwrap();
        let err = EsoboxConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
