use super::{Context, SessionArgs};
use anyhow::Result;
use std::process::ExitCode;

pub async fn execute(ctx: &Context, args: &SessionArgs) -> Result<ExitCode> {
    let booted = ctx.boot(None).await?;
    args.apply(&booted.controller).await?;

    let export = booted.controller.export().await?;
    println!("{}", export.text);
    if let Some(counter) = booted.controller.session().await.byte_counter_label() {
        eprintln!("{}", counter);
    }
    Ok(ExitCode::SUCCESS)
}
