use super::{Context, EXIT_USER_FAULT};
use super::run::print_fields;
use anyhow::Result;
use esobox_application::RunOutcome;
use esobox_core::Field;
use std::process::ExitCode;

pub async fn execute(ctx: &Context, lang: &str, run: bool) -> Result<ExitCode> {
    let controller = ctx.boot(None).await?.controller;
    controller.switch_language(lang).await?;

    let mut outcome = controller.run_hello_world().await?;
    if run && outcome.is_none() {
        outcome = Some(controller.run().await?);
    }

    let session = controller.session().await;
    match outcome {
        None => {
            println!("{}", session.get(Field::Code));
            Ok(ExitCode::SUCCESS)
        }
        Some(outcome) => {
            print_fields(&session);
            match outcome {
                RunOutcome::UserFault => Ok(ExitCode::from(EXIT_USER_FAULT)),
                _ => Ok(ExitCode::SUCCESS),
            }
        }
    }
}
