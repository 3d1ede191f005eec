//! # vault CLI entry point
//!
//! Runs the report task once and reports a single terminal result to the
//! release agent. Logs go to stderr; stdout carries only pipeline logging
//! commands.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vault_cli::publish::{run_publish, PublishArgs};
use vault_core::{ReportToken, RunContext};
use vault_publish::pipeline::{LoggingCommand, TaskResult};
use vault_publish::{CommandWriter, PublishSettings};

/// Archive an HTML report in the release's report repository.
///
/// Flattens the report, attaches it to the current release run, and pushes
/// it to a dedicated Git repository under
/// `/{definition}/{release}/{environment}/{attempt}/{token}.html`.
#[derive(Parser, Debug)]
#[command(name = "vault", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    publish: PublishArgs,
}

fn init_tracing(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Terminal `task.complete` for a failed run, carrying the full cause chain.
fn failed_command(e: &anyhow::Error) -> LoggingCommand {
    LoggingCommand::complete(TaskResult::Failed, format!("{e:#}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    tracing::debug!("vault CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let commands = CommandWriter::stdout();
    let result = async {
        let run = RunContext::from_env().context("reading release run context")?;
        let settings = PublishSettings::from_env().context("reading publish settings")?;
        let token = ReportToken::now();
        run_publish(&cli.publish, &run, settings, &token, commands.clone()).await
    }
    .await;

    let (code, terminal) = match result {
        Ok(outcome) => {
            let message = format!(
                "report archived at {} in {}",
                outcome.receipt.path, outcome.receipt.repository.name
            );
            (ExitCode::SUCCESS, LoggingCommand::complete(TaskResult::Succeeded, message))
        }
        Err(e) => {
            tracing::error!("{e:#}");
            if let Err(io) = commands.emit(&LoggingCommand::error(format!("{e:#}"))) {
                tracing::error!("failed to write logging command: {io}");
            }
            (ExitCode::from(1), failed_command(&e))
        }
    };

    if let Err(io) = commands.emit(&terminal) {
        tracing::error!("failed to write logging command: {io}");
    }
    code
}
