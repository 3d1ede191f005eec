//! # Report Task
//!
//! The outer task invoked by the release pipeline:
//!
//! 1. Validate the `htmlPath` and report-name inputs.
//! 2. Flatten the report into one document.
//! 3. Write it to the working directory and register it as a run attachment
//!    named `{reportName}-+-{token}`.
//! 4. Publish it to the report repository.
//!
//! Steps run once each, in order. A failure at any step ends the task and no
//! later step runs. In particular the attachment is written exactly once,
//! before any remote call.

use std::path::{Path, PathBuf};

use vault_core::{ReportToken, RunContext};

use crate::flatten::{FlattenError, Flattener};
use crate::pipeline::{AttachmentError, AttachmentSink};
use crate::publisher::{PublishError, PublishReceipt, PublishRequest, Publisher};
use crate::service::GitService;

/// Input name of the report path.
pub const INPUT_HTML_PATH: &str = "htmlPath";
/// Input name of the report name. Kept for compatibility with existing
/// pipeline definitions.
pub const INPUT_REPORT_NAME: &str = "nameRepository";

/// Raw task inputs as supplied by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInputs {
    pub html_path: Option<PathBuf>,
    pub report_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("input required: {0}")]
    MissingInput(&'static str),
    #[error("input {input} is invalid: {reason}")]
    InvalidInput {
        input: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Conversion(#[from] FlattenError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Successful task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Local copy registered as the run attachment.
    pub attachment: PathBuf,
    pub receipt: PublishReceipt,
}

/// The report name becomes part of the attachment file name, so it must stay
/// within the working directory.
fn check_report_name(name: &str) -> Result<(), TaskError> {
    let reason = if name.contains(['/', '\\']) {
        "must not contain path separators"
    } else if name == "." || name == ".." {
        "must not be a relative directory"
    } else {
        return Ok(());
    };
    Err(TaskError::InvalidInput {
        input: INPUT_REPORT_NAME,
        reason,
    })
}

/// Name under which a report is attached to the run.
pub fn attachment_name(report_name: &str, token: &ReportToken) -> String {
    format!("{report_name}-+-{token}")
}

/// Flattens, attaches, and publishes one report.
pub struct ReportTask<G, F, A> {
    publisher: Publisher<G>,
    flattener: F,
    attachments: A,
}

impl<G, F, A> ReportTask<G, F, A>
where
    G: GitService,
    F: Flattener,
    A: AttachmentSink,
{
    pub fn new(publisher: Publisher<G>, flattener: F, attachments: A) -> Self {
        Self {
            publisher,
            flattener,
            attachments,
        }
    }

    pub fn publisher(&self) -> &Publisher<G> {
        &self.publisher
    }

    pub async fn run(
        &self,
        inputs: &TaskInputs,
        run: &RunContext,
        token: &ReportToken,
    ) -> Result<TaskOutcome, TaskError> {
        let html_path = inputs
            .html_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(TaskError::MissingInput(INPUT_HTML_PATH))?;
        let report_name = inputs
            .report_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(TaskError::MissingInput(INPUT_REPORT_NAME))?;
        check_report_name(report_name)?;

        let document = self.flatten(html_path)?;

        let name = attachment_name(report_name, token);
        let attachment = self.attachments.attach(&name, &document)?;

        let receipt = self
            .publisher
            .publish(PublishRequest {
                content: &document,
                report_name,
                run,
                token,
            })
            .await?;

        Ok(TaskOutcome {
            attachment,
            receipt,
        })
    }

    fn flatten(&self, path: &Path) -> Result<String, FlattenError> {
        tracing::info!(path = %path.display(), "flattening report");
        self.flattener.flatten(path).map_err(|e| {
            tracing::error!(error = %e, "report conversion failed");
            e
        })
    }
}
