use super::{Context, EXIT_USER_FAULT, SessionArgs};
use anyhow::{Result, bail};
use esobox_application::RunOutcome;
use esobox_core::{Field, Session};
use std::process::ExitCode;

pub async fn execute(ctx: &Context, data: Option<String>, args: &SessionArgs) -> Result<ExitCode> {
    let booted = ctx.boot(data).await?;
    if let Some(err) = booted.decode_error {
        eprintln!("{}", err);
        return Ok(ExitCode::from(EXIT_USER_FAULT));
    }

    let controller = booted.controller;
    args.apply(&controller).await?;

    let result = controller.run().await;
    print_fields(&controller.session().await);

    match result? {
        RunOutcome::Completed => Ok(ExitCode::SUCCESS),
        RunOutcome::UserFault => Ok(ExitCode::from(EXIT_USER_FAULT)),
        RunOutcome::AlreadyRunning => bail!("a run is already in progress"),
    }
}

/// Writes Output to stdout and Debug, with its banner, to stderr.
pub(crate) fn print_fields(session: &Session) {
    print!("{}", session.get(Field::Output));
    let debug = session.get(Field::Debug);
    if !debug.is_empty() {
        eprintln!("{}", debug);
    }
    let banner = session.message(Field::Debug);
    if !banner.is_empty() {
        eprintln!("{}", banner);
    }
}
