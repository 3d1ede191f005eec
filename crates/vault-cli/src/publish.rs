//! # Publish Command
//!
//! Wires task inputs, agent environment, and the chosen Git backend into a
//! [`ReportTask`] and runs it once.
//!
//! With `--dry-run` the report is still flattened and attached, but the
//! publish goes to an in-memory repository instead of the hosted service.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use vault_core::{ReportToken, RunContext};
use vault_git_client::{DevOpsConfig, GitClient};
use vault_publish::task::TaskOutcome;
use vault_publish::{
    CommandWriter, FileFlattener, GitService, InMemoryGitService, PipelineAttachmentSink,
    PublishOptions, PublishSettings, Publisher, ReportTask, TaskInputs,
};

/// Arguments for publishing one report.
#[derive(Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Path of the HTML report to archive.
    #[arg(long, env = "INPUT_HTMLPATH")]
    pub html_path: Option<PathBuf>,

    /// Report name, used as the attachment prefix and commit comment.
    #[arg(long, env = "INPUT_NAMEREPOSITORY")]
    pub report_name: Option<String>,

    /// Repository that stores the archived reports.
    #[arg(long)]
    pub repository_name: Option<String>,

    /// Extra push attempts after the branch moved underneath us.
    #[arg(long)]
    pub conflict_retries: Option<u32>,

    /// Publish to an in-memory repository instead of Azure DevOps.
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    /// Apply command-line overrides on top of environment settings.
    pub fn apply(&self, mut settings: PublishSettings) -> PublishSettings {
        if let Some(name) = self.repository_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                settings.repository_name = name.to_string();
            }
        }
        if let Some(retries) = self.conflict_retries {
            settings.conflict_retries = retries;
        }
        settings
    }

    fn inputs(&self) -> TaskInputs {
        TaskInputs {
            html_path: self.html_path.clone(),
            report_name: self.report_name.clone(),
        }
    }
}

/// Run the report task once.
pub async fn run_publish<W>(
    args: &PublishArgs,
    run: &RunContext,
    settings: PublishSettings,
    token: &ReportToken,
    commands: CommandWriter<W>,
) -> anyhow::Result<TaskOutcome>
where
    W: Write + Send + 'static,
{
    let settings = args.apply(settings);
    tracing::info!(
        project = %settings.project,
        repository = %settings.repository_name,
        token = %token,
        dry_run = args.dry_run,
        "publishing report"
    );

    if args.dry_run {
        let service = InMemoryGitService::new();
        return execute(service, args, run, &settings, token, commands).await;
    }

    let config = DevOpsConfig::from_env().context("reading Azure DevOps connection settings")?;
    let client = GitClient::new(config).context("building Azure DevOps client")?;
    execute(client, args, run, &settings, token, commands).await
}

async fn execute<G, W>(
    service: G,
    args: &PublishArgs,
    run: &RunContext,
    settings: &PublishSettings,
    token: &ReportToken,
    commands: CommandWriter<W>,
) -> anyhow::Result<TaskOutcome>
where
    G: GitService,
    W: Write + Send + 'static,
{
    let publisher = Publisher::new(service, &settings.project, &settings.repository_name)
        .with_options(PublishOptions {
            conflict_retries: settings.conflict_retries,
        });
    let task = ReportTask::new(
        publisher,
        FileFlattener,
        PipelineAttachmentSink::new(run.working_dir(), commands),
    );

    let outcome = task.run(&args.inputs(), run, token).await?;
    Ok(outcome)
}
