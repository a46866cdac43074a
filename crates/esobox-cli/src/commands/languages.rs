use super::Context;
use anyhow::Result;
use std::process::ExitCode;

pub fn execute(ctx: &Context, json: bool) -> Result<ExitCode> {
    let languages = ctx.runtime.services.catalog.usable();

    if json {
        println!("{}", serde_json::to_string_pretty(&languages)?);
        return Ok(ExitCode::SUCCESS);
    }

    for info in languages {
        let hello = if info.has_hello_world() { " [hello world]" } else { "" };
        match &info.details {
            Some(details) => println!("{}{}  {}", info.name, hello, details),
            None => println!("{}{}", info.name, hello),
        }
    }
    Ok(ExitCode::SUCCESS)
}
