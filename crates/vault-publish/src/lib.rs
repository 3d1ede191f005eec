//! # vault-publish: Report Publishing Workflow
//!
//! Archives a flattened HTML report in a dedicated Git repository:
//!
//! ```text
//! Provisioning ──▶ ResolvingTip ──▶ BuildingPush ──▶ Submitting ──▶ done
//!      │                │                                │
//!      └────────────────┴───────── Failed ◀──────────────┘
//! ```
//!
//! - [`provision`]: get-or-create the repository (`Found | Created`).
//! - [`resolve`]: tip commit of the default branch, or the null commit.
//! - [`push`]: pure construction of the single-file push.
//! - [`publisher`]: the orchestrator; one terminal result per invocation.
//! - [`task`]: the outer report task: inputs, flattening, attachment, publish.
//!
//! Remote access goes through the [`GitService`] trait, implemented for
//! [`vault_git_client::GitClient`] and for the [`memory::InMemoryGitService`]
//! used in tests and dry runs.

pub mod flatten;
pub mod memory;
pub mod pipeline;
pub mod provision;
pub mod publisher;
pub mod push;
pub mod resolve;
pub mod service;
pub mod settings;
pub mod task;

pub use flatten::{FileFlattener, FlattenError, Flattener};
pub use memory::InMemoryGitService;
pub use pipeline::{AttachmentError, AttachmentSink, CommandWriter, PipelineAttachmentSink};
pub use provision::Provisioned;
pub use publisher::{PublishError, PublishOptions, PublishPhase, PublishReceipt, PublishRequest, Publisher};
pub use service::GitService;
pub use settings::{PublishSettings, SettingsError, DEFAULT_REPOSITORY_NAME};
pub use task::{attachment_name, ReportTask, TaskError, TaskInputs, TaskOutcome};
