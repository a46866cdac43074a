//! TOML-based language catalog.
//!
//! ```toml
//! [[language]]
//! name = "Brainfuck"
//! details = "https://esolangs.org/wiki/Brainfuck"
//! command = ["bf", "{file}"]
//! hello_world = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++."
//!
//! [[language]]
//! name = "Unfinished"
//! wip = true
//! ```

use anyhow::{Context, Result};
use esobox_core::language::{LanguageCatalog, LanguageInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `[[language]]` table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LanguageEntry {
    #[serde(flatten)]
    pub info: LanguageInfo,
    /// Interpreter argv; `{file}` is replaced by the program file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Sample program returned for hello-world requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hello_world: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct CatalogRoot {
    #[serde(rename = "language", default)]
    languages: Vec<LanguageEntry>,
}

/// Language catalog read from a TOML file.
#[derive(Debug, Clone)]
pub struct TomlLanguageCatalog {
    entries: Vec<LanguageEntry>,
}

impl TomlLanguageCatalog {
    /// Parses a catalog document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let root: CatalogRoot = toml::from_str(content)?;
        Ok(Self {
            entries: root.languages,
        })
    }

    /// Reads a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language catalog {:?}", path))?;
        let catalog = Self::from_toml(&content)
            .with_context(|| format!("Invalid language catalog {:?}", path))?;
        tracing::info!(
            "[LanguageCatalog] Loaded {} languages from {:?}",
            catalog.entries.len(),
            path
        );
        Ok(catalog)
    }

    /// Reads `path` if given and present, otherwise falls back to
    /// [`TomlLanguageCatalog::builtin`].
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                tracing::debug!("[LanguageCatalog] No catalog file, using built-in catalog");
                Ok(Self::builtin())
            }
        }
    }

    /// The catalog used when no file is configured: the `Text` language,
    /// whose output is the program itself.
    pub fn builtin() -> Self {
        Self {
            entries: vec![LanguageEntry {
                info: LanguageInfo {
                    details: Some("https://esolangs.org/wiki/Text".to_string()),
                    ..LanguageInfo::new("Text")
                },
                command: Some(vec!["cat".to_string(), "{file}".to_string()]),
                hello_world: Some("Hello, World!".to_string()),
            }],
        }
    }

    /// Looks up the full entry, including interpreter settings.
    pub fn entry(&self, name: &str) -> Option<&LanguageEntry> {
        self.entries.iter().find(|entry| entry.info.name == name)
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }
}

impl LanguageCatalog for TomlLanguageCatalog {
    fn list(&self) -> Vec<LanguageInfo> {
        self.entries.iter().map(|entry| entry.info.clone()).collect()
    }

    fn get(&self, name: &str) -> Option<LanguageInfo> {
        self.entry(name).map(|entry| entry.info.clone())
    }
}
