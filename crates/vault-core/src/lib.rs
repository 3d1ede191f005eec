//! # vault-core: Foundational Types for report-vault
//!
//! Every other crate in the workspace depends on `vault-core` for the
//! identifiers and value types that flow through a publish:
//!
//! - [`CommitId`]: 40-hex commit hash used as the optimistic-concurrency
//!   token, including the all-zero "no parent" sentinel.
//! - [`RepositoryId`]: opaque repository identifier assigned by the host.
//! - [`RunContext`]: the identity of the current release run plus its
//!   working directory, built explicitly instead of read from ambient globals.
//! - [`ReportToken`]: per-invocation unique token naming the archived file.
//! - [`ArtifactPath`]: the deterministic in-repository path of a report.
//!
//! ## Crate Policy
//!
//! - No I/O beyond reading environment variables in [`RunContext::from_env`].
//! - No dependency on the HTTP client or the publish workflow.

pub mod artifact;
pub mod error;
pub mod identity;
pub mod run;

pub use artifact::{ArtifactPath, ReportToken};
pub use error::{CommitIdError, RunContextError};
pub use identity::{CommitId, RepositoryId, DEFAULT_BRANCH, NULL_COMMIT};
pub use run::RunContext;
