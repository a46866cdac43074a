//! Language catalog.
//!
//! The catalog is supplied from outside the core. Only entries that are not
//! work-in-progress and not explicitly marked unsupported are usable.

use serde::{Deserialize, Serialize};

/// Metadata describing one language variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Display and wire name of the language
    pub name: String,
    /// Whether a hello-world sample exists; absent means it does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_prog: Option<bool>,
    /// Free-form details, usually a link to the language's documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// `Some(false)` excludes the language from interactive use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_support: Option<bool>,
    /// Work-in-progress languages are never offered
    #[serde(default)]
    pub wip: bool,
}

impl LanguageInfo {
    /// Creates an entry with every optional attribute absent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hw_prog: None,
            details: None,
            browser_support: None,
            wip: false,
        }
    }

    /// Absence of the `hw_prog` flag is treated as "supported".
    pub fn has_hello_world(&self) -> bool {
        self.hw_prog.unwrap_or(true)
    }

    /// Non-experimental and not explicitly unsupported.
    pub fn is_usable(&self) -> bool {
        !self.wip && self.browser_support != Some(false)
    }
}

/// Source of language metadata.
pub trait LanguageCatalog: Send + Sync {
    /// Every known language, including unusable ones.
    fn list(&self) -> Vec<LanguageInfo>;

    /// Looks up a language by exact name.
    fn get(&self, name: &str) -> Option<LanguageInfo> {
        self.list().into_iter().find(|info| info.name == name)
    }

    /// Languages a session may select.
    fn usable(&self) -> Vec<LanguageInfo> {
        self.list().into_iter().filter(LanguageInfo::is_usable).collect()
    }

    /// Looks up a language a session may select.
    fn get_usable(&self, name: &str) -> Option<LanguageInfo> {
        self.get(name).filter(LanguageInfo::is_usable)
    }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticLanguageCatalog {
    languages: Vec<LanguageInfo>,
}

impl StaticLanguageCatalog {
    pub fn new(languages: Vec<LanguageInfo>) -> Self {
        Self { languages }
    }
}

impl LanguageCatalog for StaticLanguageCatalog {
    fn list(&self) -> Vec<LanguageInfo> {
        self.languages.clone()
    }
}
