use super::{Context, EXIT_USER_FAULT};
use anyhow::Result;
use esobox_application::bootstrap::controller_settings;
use std::process::ExitCode;

pub async fn execute(ctx: &Context, token: &str) -> Result<ExitCode> {
    let settings = controller_settings(&ctx.config, &ctx.launch)?;
    let decoded = settings
        .codec
        .decode(
            token,
            ctx.runtime.services.catalog.as_ref(),
            ctx.runtime.resolver.as_ref(),
        )
        .await;

    match decoded {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::from(EXIT_USER_FAULT))
        }
    }
}
