//! Infrastructure layer for Esobox.
//!
//! Concrete implementations of the collaborators the core depends on:
//! configuration files, the language catalog, subprocess interpreters,
//! legacy code resolution and fault reporting.

pub mod adapter;
pub mod config;
pub mod fault_reporter;
pub mod file_code_resolver;
pub mod paths;
pub mod process_interpreter;
pub mod toml_language_catalog;

pub use crate::config::EsoboxConfig;
pub use crate::fault_reporter::{HttpFaultReporter, TracingFaultReporter, reporter_for};
pub use crate::file_code_resolver::FileCodeResolver;
pub use crate::process_interpreter::ProcessInterpreter;
pub use crate::toml_language_catalog::{LanguageEntry, TomlLanguageCatalog};
