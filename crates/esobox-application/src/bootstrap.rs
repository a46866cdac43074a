//! Session bootstrap.
//!
//! Turns launch parameters and configuration into a ready
//! [`SessionController`]: the collaborators are built from the config, the
//! initial session is decoded from the launch token (or left blank), and its
//! language is activated.

use crate::export::{ExportFormat, ExportSettings};
use crate::session_controller::{ControllerServices, ControllerSettings, SessionController};
use anyhow::Context;
use esobox_core::codec::{ProtocolVersion, SessionCodec};
use esobox_core::encoding::EncodingRegistry;
use esobox_core::error::DecodeError;
use esobox_core::language::LanguageCatalog;
use esobox_core::resolver::{CodeResolver, NoCodeResolver};
use esobox_core::run_lock::RunLock;
use esobox_core::session::{Field, Session, SessionRecord, SharedSession};
use esobox_core::{CoreError, Result};
use esobox_infrastructure::{
    EsoboxConfig, FileCodeResolver, ProcessInterpreter, TomlLanguageCatalog, reporter_for,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Parameters the application was launched with. Each one that is set
/// overrides the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Session token to restore
    pub data: Option<String>,
    /// Protocol version for exports
    pub ver: Option<String>,
    /// Render exports as wiki links
    pub wiki: Option<bool>,
    /// Offline mode: faults are not reported
    pub local: Option<bool>,
}

/// A bootstrapped session.
pub struct Bootstrapped {
    pub controller: SessionController,
    /// Why the launch token was rejected, if it was
    pub decode_error: Option<DecodeError>,
}

/// Collaborators built from configuration.
pub struct Runtime {
    pub services: ControllerServices,
    pub resolver: Arc<dyn CodeResolver>,
}

impl Runtime {
    /// Builds the catalog, interpreter, resolver and fault reporter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured language catalog cannot be read.
    pub fn from_config(config: &EsoboxConfig, launch: &LaunchParams) -> anyhow::Result<Self> {
        let languages_path = config.languages_path();
        let catalog = Arc::new(
            TomlLanguageCatalog::load_or_builtin(languages_path.as_deref())
                .context("Failed to load language catalog")?,
        );
        let resolver: Arc<dyn CodeResolver> = match &config.paths.legacy_code_root {
            Some(root) => Arc::new(FileCodeResolver::new(root)),
            None => Arc::new(NoCodeResolver),
        };
        let local = launch.local.unwrap_or(config.runtime.local);

        Ok(Self {
            services: ControllerServices {
                catalog: catalog.clone(),
                interpreter: Arc::new(ProcessInterpreter::new(catalog)),
                encodings: EncodingRegistry::default(),
                reporter: reporter_for(local, config.runtime.report_endpoint.as_deref()),
            },
            resolver,
        })
    }
}

/// Resolves controller settings from configuration and launch parameters.
///
/// # Errors
///
/// Returns a configuration error if the requested export version cannot be
/// parsed, is not supported, or is read-only.
pub fn controller_settings(
    config: &EsoboxConfig,
    launch: &LaunchParams,
) -> Result<ControllerSettings> {
    let export_version = match &launch.ver {
        Some(ver) => ver.parse::<ProtocolVersion>()?,
        None => config.protocol.default_version,
    };
    config
        .validate_export_version(export_version)
        .map_err(|e| CoreError::config(e.to_string()))?;

    Ok(ControllerSettings {
        codec: SessionCodec::new(
            config.protocol.magic.clone(),
            config.protocol.supported_versions.clone(),
        ),
        export_version,
        export: ExportSettings {
            base_url: config.export.base_url.clone(),
            project: config.export.project.clone(),
            format: ExportFormat::from_wiki_flag(launch.wiki.unwrap_or(config.export.wiki)),
        },
        auto_run_hello_world: config.runtime.auto_run_hello_world,
    })
}

/// Language of a blank session: the configured default when usable, the
/// first usable language otherwise.
pub fn default_language(config: &EsoboxConfig, catalog: &dyn LanguageCatalog) -> Result<String> {
    if catalog.get_usable(&config.runtime.default_language).is_some() {
        return Ok(config.runtime.default_language.clone());
    }
    catalog
        .usable()
        .into_iter()
        .next()
        .map(|info| {
            tracing::warn!(
                "[Bootstrap] Default language {:?} is not usable, using {}",
                config.runtime.default_language,
                info.name
            );
            info.name
        })
        .ok_or_else(|| CoreError::config("the language catalog has no usable languages"))
}

/// Creates the controller for a launch.
///
/// A launch token that fails to decode is not fatal: the session starts
/// blank and the error is shown on the Code field.
pub async fn bootstrap(
    launch: &LaunchParams,
    config: &EsoboxConfig,
    runtime: &Runtime,
) -> Result<Bootstrapped> {
    let settings = controller_settings(config, launch)?;
    let catalog = runtime.services.catalog.as_ref();

    let (record, decode_error) = match &launch.data {
        Some(token) => match settings
            .codec
            .decode(token, catalog, runtime.resolver.as_ref())
            .await
        {
            Ok(record) => {
                tracing::info!("[Bootstrap] Restored {} session", record.language);
                (record, None)
            }
            Err(err) => {
                tracing::warn!("[Bootstrap] Rejected launch token: {}", err);
                (SessionRecord::blank(default_language(config, catalog)?), Some(err))
            }
        },
        None => (SessionRecord::blank(default_language(config, catalog)?), None),
    };

    let language = record.language.clone();
    let mut session = Session::from_record(record, &runtime.services.encodings);
    if let Some(err) = &decode_error {
        session.show_message(Field::Code, err.to_string());
    }

    let session: SharedSession = Arc::new(RwLock::new(session));
    let lock = RunLock::new(session.clone());
    let controller = SessionController::new(session, lock, runtime.services.clone(), settings);

    let hello_world = controller.activate_language(&language).await?;
    tracing::debug!(
        "[Bootstrap] Session ready, hello world {}",
        if hello_world { "available" } else { "unavailable" }
    );

    Ok(Bootstrapped {
        controller,
        decode_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use esobox_core::fault::NoopFaultReporter;
    use esobox_core::interpreter::Adapter;
    use tempfile::TempDir;

    fn runtime(catalog: TomlLanguageCatalog) -> Runtime {
        let catalog = Arc::new(catalog);
        Runtime {
            services: ControllerServices {
                catalog: catalog.clone(),
                interpreter: Arc::new(ProcessInterpreter::new(catalog)),
                encodings: EncodingRegistry::default(),
                reporter: Arc::new(NoopFaultReporter),
            },
            resolver: Arc::new(NoCodeResolver),
        }
    }

    fn catalog() -> TomlLanguageCatalog {
        TomlLanguageCatalog::from_toml(
            r#"
            [[language]]
            name = "Brainfuck"
            details = "https://esolangs.org/wiki/Brainfuck"

            [[language]]
            name = "Text"
            hw_prog = false
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_blank_launch() {
        let config = EsoboxConfig::default();
        let booted = bootstrap(&LaunchParams::default(), &config, &runtime(catalog()))
            .await
            .unwrap();

        assert!(booted.decode_error.is_none());
        let session = booted.controller.session().await;
        assert_eq!(session.language(), "Text");
        assert_eq!(session.input_adapter(), Some(Adapter::Text));
        assert_eq!(session.output_adapter(), Some(Adapter::Text));
        assert_eq!(session.message(Field::Code), "");
        assert!(!booted.controller.hello_world_available().await);
    }

    #[tokio::test]
    async fn test_restores_launch_token() {
        let config = EsoboxConfig::default();
        let rt = runtime(catalog());
        let mut record = SessionRecord::blank("Brainfuck");
        record.code = "+[-]".to_string();
        let token = controller_settings(&config, &LaunchParams::default())
            .unwrap()
            .codec
            .encode(&record, ProtocolVersion::V1_0_0);

        let launch = LaunchParams {
            data: Some(token),
            ..LaunchParams::default()
        };
        let booted = bootstrap(&launch, &config, &rt).await.unwrap();
        let session = booted.controller.session().await;
        assert_eq!(session.record(), record);
        assert!(booted.controller.hello_world_available().await);
    }

    #[tokio::test]
    async fn test_bad_token_gives_blank_session_with_banner() {
        let config = EsoboxConfig::default();
        let launch = LaunchParams {
            data: Some("!!!invalid!!!".to_string()),
            ..LaunchParams::default()
        };
        let booted = bootstrap(&launch, &config, &runtime(catalog()))
            .await
            .unwrap();

        assert!(booted.decode_error.as_ref().unwrap().is_invalid_token());
        let session = booted.controller.session().await;
        assert_eq!(session.language(), "Text");
        assert_eq!(session.get(Field::Code), "");
        assert_eq!(session.message(Field::Code), "Invalid URL");
    }

    #[tokio::test]
    async fn test_falls_back_to_first_usable_language() {
        let config = EsoboxConfig::from_toml(
            r#"
            [runtime]
            default_language = "Cobol"
            "#,
        )
        .unwrap();
        let booted = bootstrap(&LaunchParams::default(), &config, &runtime(catalog()))
            .await
            .unwrap();
        assert_eq!(booted.controller.session().await.language(), "Brainfuck");
    }

    #[tokio::test]
    async fn test_empty_catalog_is_config_error() {
        let config = EsoboxConfig::default();
        let empty = TomlLanguageCatalog::from_toml("").unwrap();
        let result = bootstrap(&LaunchParams::default(), &config, &runtime(empty)).await;
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_settings_from_launch_params() {
        let config = EsoboxConfig::default();
        let settings = controller_settings(
            &config,
            &LaunchParams {
                wiki: Some(true),
                ver: Some("1.0.0".to_string()),
                ..LaunchParams::default()
            },
        )
        .unwrap();
        assert_eq!(settings.export.format, ExportFormat::Wiki);
        assert_eq!(settings.export_version, ProtocolVersion::V1_0_0);
    }

    #[test]
    fn test_settings_reject_read_only_and_unknown_versions() {
        let config = EsoboxConfig::default();
        for ver in ["1.0.1", "3.0.0", "one"] {
            let result = controller_settings(
                &config,
                &LaunchParams {
                    ver: Some(ver.to_string()),
                    ..LaunchParams::default()
                },
            );
            assert!(matches!(result, Err(CoreError::Config(_))), "{}", ver);
        }
    }

    #[test]
    fn test_runtime_from_config() {
        let dir = TempDir::new().unwrap();
        let languages = dir.path().join("languages.toml");
        std::fs::write(&languages, "[[language]]\nname = \"Brainfuck\"\n").unwrap();

        let config = EsoboxConfig::from_toml(&format!(
            "[paths]\nlanguages = {:?}\nlegacy_code_root = {:?}\n",
            languages,
            dir.path()
        ))
        .unwrap();
        let rt = Runtime::from_config(&config, &LaunchParams::default()).unwrap();
        assert!(rt.services.catalog.get("Brainfuck").is_some());
        assert!(rt.services.catalog.get("Text").is_none());
    }
}
