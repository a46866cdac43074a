//! Subcommand implementations and the state they share.

pub mod decode;
pub mod encode;
pub mod hello_world;
pub mod languages;
pub mod run;

use anyhow::{Context as _, Result};
use clap::Args;
use esobox_application::{Bootstrapped, LaunchParams, Runtime, SessionController, bootstrap};
use esobox_core::Field;
use esobox_core::interpreter::Adapter;
use esobox_infrastructure::EsoboxConfig;
use std::path::{Path, PathBuf};

/// Exit status of a run whose program faulted.
pub const EXIT_USER_FAULT: u8 = 1;
/// Exit status of an internal fault.
pub const EXIT_INTERNAL_FAULT: u8 = 2;

/// Configuration and collaborators resolved from the global flags.
pub struct Context {
    pub config: EsoboxConfig,
    pub launch: LaunchParams,
    pub runtime: Runtime,
}

impl Context {
    pub fn load(config: Option<&Path>, ver: Option<String>, wiki: bool, local: bool) -> Result<Self> {
        let config = EsoboxConfig::load(config)?;
        let launch = LaunchParams {
            data: None,
            ver,
            wiki: wiki.then_some(true),
            local: local.then_some(true),
        };
        let runtime = Runtime::from_config(&config, &launch)?;
        tracing::debug!(
            "[Cli] {} languages available, export version {}",
            runtime.services.catalog.usable().len(),
            launch.ver.as_deref().unwrap_or("default")
        );
        Ok(Self {
            config,
            launch,
            runtime,
        })
    }

    /// Bootstraps a session, restoring `data` when given.
    pub async fn boot(&self, data: Option<String>) -> Result<Bootstrapped> {
        let launch = LaunchParams {
            data,
            ..self.launch.clone()
        };
        Ok(bootstrap(&launch, &self.config, &self.runtime).await?)
    }
}

/// Session contents given on the command line.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Language of the session
    #[arg(long)]
    pub lang: Option<String>,

    /// File holding the program
    #[arg(long)]
    pub code: Option<PathBuf>,

    #[arg(long)]
    pub header: Option<String>,

    #[arg(long)]
    pub footer: Option<String>,

    /// Text passed to the program
    #[arg(long)]
    pub input: Option<String>,

    /// `text`, `byte-array`, or empty for none
    #[arg(long)]
    pub input_adapter: Option<String>,

    /// `text`, `byte-array`, or empty for none
    #[arg(long)]
    pub output_adapter: Option<String>,
}

impl SessionArgs {
    /// Applies every given value to the controller's session.
    pub async fn apply(&self, controller: &SessionController) -> Result<()> {
        if let Some(lang) = &self.lang {
            controller.switch_language(lang).await?;
        }
        if let Some(path) = &self.code {
            let code = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read program file {:?}", path))?;
            controller.edit(Field::Code, code).await?;
        }
        let texts = [
            (Field::Header, &self.header),
            (Field::Footer, &self.footer),
            (Field::Input, &self.input),
        ];
        for (field, text) in texts {
            if let Some(text) = text {
                controller.edit(field, text.clone()).await?;
            }
        }

        if self.input_adapter.is_some() || self.output_adapter.is_some() {
            let session = controller.session().await;
            let input = parse_adapter(self.input_adapter.as_deref(), session.input_adapter())?;
            let output = parse_adapter(self.output_adapter.as_deref(), session.output_adapter())?;
            controller.set_adapters(input, output).await;
        }
        Ok(())
    }
}

fn parse_adapter(arg: Option<&str>, current: Option<Adapter>) -> Result<Option<Adapter>> {
    match arg {
        Some(name) => Ok(Adapter::from_wire(name)?),
        None => Ok(current),
    }
}
