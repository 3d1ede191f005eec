//! # Pipeline Integration
//!
//! The release agent reads logging commands from the task's stdout:
//!
//! ```text
//! ##vso[task.addattachment type=publish-report;name=nightly-+-1700000000000;]/work/nightly-+-1700000000000.html
//! ##vso[task.complete result=Failed;]push to refs/heads/master rejected
//! ```
//!
//! Property values and messages are escaped so user-supplied text cannot
//! terminate a command early or inject a second one.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use vault_core::artifact::REPORT_EXTENSION;

/// Attachment type the report viewer extension looks for.
pub const ATTACHMENT_TYPE: &str = "publish-report";

fn escape_message(raw: &str) -> String {
    raw.replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(raw: &str) -> String {
    escape_message(raw).replace(']', "%5D").replace(';', "%3B")
}

/// Outcome reported with `task.complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// A single `##vso[...]` logging command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingCommand {
    command: &'static str,
    properties: Vec<(&'static str, String)>,
    message: String,
}

impl LoggingCommand {
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            properties: Vec::new(),
            message: message.into(),
        }
    }

    pub fn property(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.properties.push((key, value.into()));
        self
    }

    /// `task.addattachment` registering `path` under `name`.
    pub fn add_attachment(name: &str, path: &Path) -> Self {
        Self::new("task.addattachment", path.display().to_string())
            .property("type", ATTACHMENT_TYPE)
            .property("name", name)
    }

    /// `task.complete` with the final task result.
    pub fn complete(result: TaskResult, message: impl Into<String>) -> Self {
        Self::new("task.complete", message).property("result", result.to_string())
    }

    /// `task.logissue` of type error.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("task.logissue", message).property("type", "error")
    }
}

impl fmt::Display for LoggingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##vso[{}", self.command)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ';' };
            write!(f, "{sep}{key}={}", escape_property(value))?;
        }
        if !self.properties.is_empty() {
            f.write_str(";")?;
        }
        write!(f, "]{}", escape_message(&self.message))
    }
}

/// Writes logging commands to a shared output, one per line.
pub struct CommandWriter<W> {
    out: Arc<Mutex<W>>,
}

impl<W> Clone for CommandWriter<W> {
    fn clone(&self) -> Self {
        Self {
            out: Arc::clone(&self.out),
        }
    }
}

impl<W> fmt::Debug for CommandWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandWriter").finish_non_exhaustive()
    }
}

impl CommandWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl CommandWriter<Vec<u8>> {
    /// Everything written so far, for inspection.
    pub fn captured(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }
}

impl<W: Write> CommandWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn emit(&self, command: &LoggingCommand) -> io::Result<()> {
        let mut out = self.out.lock();
        writeln!(out, "{command}")?;
        out.flush()
    }
}

/// Failure to make the report available as a run attachment.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to write attachment {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to register attachment {name}: {source}")]
    Register { name: String, source: io::Error },
}

/// Makes a flattened report available to the pipeline UI.
pub trait AttachmentSink: Send + Sync {
    /// Store `content` under `name` and register it. Returns the local path.
    fn attach(&self, name: &str, content: &str) -> Result<PathBuf, AttachmentError>;
}

/// Writes `{working_dir}/{name}.html` and registers it with
/// `task.addattachment`.
#[derive(Debug, Clone)]
pub struct PipelineAttachmentSink<W> {
    working_dir: PathBuf,
    commands: CommandWriter<W>,
}

impl<W: Write> PipelineAttachmentSink<W> {
    pub fn new(working_dir: impl Into<PathBuf>, commands: CommandWriter<W>) -> Self {
        Self {
            working_dir: working_dir.into(),
            commands,
        }
    }
}

impl<W: Write + Send> AttachmentSink for PipelineAttachmentSink<W> {
    fn attach(&self, name: &str, content: &str) -> Result<PathBuf, AttachmentError> {
        let path = self.working_dir.join(format!("{name}.{REPORT_EXTENSION}"));
        std::fs::write(&path, content).map_err(|source| AttachmentError::Write {
            path: path.clone(),
            source,
        })?;
        self.commands
            .emit(&LoggingCommand::add_attachment(name, &path))
            .map_err(|source| AttachmentError::Register {
                name: name.to_string(),
                source,
            })?;
        tracing::info!(attachment = name, path = %path.display(), "report attached");
        Ok(path)
    }
}
