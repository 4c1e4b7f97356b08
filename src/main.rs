// ABOUTME: Entry point for the fastack CLI application.
// ABOUTME: Parses arguments, wires logging and Ctrl-C cancellation, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::DeployArgs;
use fastack::credentials;
use fastack::error::Result;
use fastack::output::{Output, OutputMode};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = run(cli, Output::new(mode), cancel).await;
    // An interrupted password prompt leaves its reader thread blocked with
    // echo off; exiting skips that thread's cleanup.
    credentials::restore_terminal();

    if let Err(e) = result {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, output: Output, cancel: CancellationToken) -> Result<()> {
    match cli.command {
        Commands::Deploy {
            directory,
            app,
            server,
            lenient,
            stream,
            skip_version_check,
            max_concurrency,
        } => {
            let args = DeployArgs {
                directory: directory.unwrap_or_else(|| PathBuf::from(".")),
                app,
                server,
                lenient,
                stream,
                skip_version_check,
                max_concurrency,
            };
            commands::deploy(args, output, cancel).await
        }
        Commands::Create { app_name, force } => commands::create(app_name, force, &output),
    }
}
