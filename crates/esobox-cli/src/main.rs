use anyhow::Result;
use clap::{Parser, Subcommand};
use esobox_core::CoreError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Context, SessionArgs};

#[derive(Parser)]
#[command(name = "esobox")]
#[command(about = "Esobox CLI - run, share and restore esolang sessions", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Protocol version used for new tokens
    #[arg(long, global = true)]
    ver: Option<String>,

    /// Render exports as wiki links
    #[arg(long, global = true)]
    wiki: bool,

    /// Offline mode: internal faults are not reported
    #[arg(long, global = true)]
    local: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the usable languages
    Languages {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the session stored in a token as JSON
    Decode {
        token: String,
    },
    /// Build a session and print its shareable export
    Encode {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Run a session and print its output
    Run {
        /// Token of the session to run
        #[arg(long)]
        data: Option<String>,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Load a language's hello-world program
    HelloWorld {
        #[arg(long)]
        lang: String,

        /// Run the program after loading it
        #[arg(long)]
        run: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let ctx = Context::load(cli.config.as_deref(), cli.ver, cli.wiki, cli.local)?;

    match cli.command {
        Commands::Languages { json } => commands::languages::execute(&ctx, json),
        Commands::Decode { token } => commands::decode::execute(&ctx, &token).await,
        Commands::Encode { session } => commands::encode::execute(&ctx, &session).await,
        Commands::Run { data, session } => commands::run::execute(&ctx, data, &session).await,
        Commands::HelloWorld { lang, run } => {
            commands::hello_world::execute(&ctx, &lang, run).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let internal = err
                .downcast_ref::<CoreError>()
                .is_some_and(CoreError::is_internal);
            if internal {
                ExitCode::from(commands::EXIT_INTERNAL_FAULT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
