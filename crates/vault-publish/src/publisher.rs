//! # Publisher
//!
//! Runs one publish to completion: provision the repository, resolve the
//! branch tip, build the push, submit it. Phases are strictly sequential and
//! every invocation yields exactly one terminal result.
//!
//! ## Concurrency
//!
//! The push carries the tip observed in [`PublishPhase::ResolvingTip`] as its
//! expected prior state. When another writer lands a commit in between, the
//! service rejects the push with a conflict. By default that conflict is
//! terminal. With [`PublishOptions::conflict_retries`] above zero the
//! publisher re-resolves the tip and resubmits, up to that many extra times.
//! Provisioning is never repeated.

use std::fmt;

use vault_core::{ArtifactPath, CommitId, ReportToken, RunContext, DEFAULT_BRANCH};
use vault_git_client::{GitApiError, GitRepository};

use crate::provision::get_or_create;
use crate::push::build_push;
use crate::resolve::resolve_tip;
use crate::service::GitService;

/// Phase of a publish, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishPhase {
    Provisioning,
    ResolvingTip,
    BuildingPush,
    Submitting,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisioning => write!(f, "provisioning repository"),
            Self::ResolvingTip => write!(f, "resolving tip commit"),
            Self::BuildingPush => write!(f, "building push"),
            Self::Submitting => write!(f, "submitting push"),
        }
    }
}

/// Terminal failure of a publish.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A remote call failed for a reason other than a stale tip.
    #[error("{phase} failed: {source}")]
    Remote {
        phase: PublishPhase,
        source: GitApiError,
    },
    /// The branch moved between tip resolution and submission on every
    /// attempt.
    #[error("push to {branch} rejected: tip {expected} is stale after {attempts} attempt(s): {source}")]
    Conflict {
        branch: &'static str,
        expected: CommitId,
        attempts: u32,
        source: GitApiError,
    },
}

impl PublishError {
    /// Phase in which the publish stopped.
    pub fn phase(&self) -> PublishPhase {
        match self {
            Self::Remote { phase, .. } => *phase,
            Self::Conflict { .. } => PublishPhase::Submitting,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    fn remote(phase: PublishPhase) -> impl FnOnce(GitApiError) -> Self {
        move |source| Self::Remote { phase, source }
    }
}

/// Tunables for a [`Publisher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishOptions {
    /// Extra submissions after a stale-tip rejection. Zero means a conflict
    /// is terminal.
    pub conflict_retries: u32,
}

/// One report to archive.
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Flattened report document, stored verbatim.
    pub content: &'a str,
    /// Human-readable report name; becomes the commit comment.
    pub report_name: &'a str,
    pub run: &'a RunContext,
    pub token: &'a ReportToken,
}

/// Successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub repository: GitRepository,
    /// Whether this publish created the repository.
    pub created_repository: bool,
    pub path: ArtifactPath,
    /// Tip the accepted push was built against.
    pub previous_tip: CommitId,
    /// New tip reported by the service, when present in the response.
    pub new_tip: Option<CommitId>,
    pub push_id: Option<u64>,
    /// Number of submissions, including the accepted one.
    pub attempts: u32,
}

/// Archives reports in a named repository of one project.
#[derive(Debug, Clone)]
pub struct Publisher<G> {
    service: G,
    project: String,
    repository_name: String,
    options: PublishOptions,
}

impl<G: GitService> Publisher<G> {
    pub fn new(service: G, project: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Self {
            service,
            project: project.into(),
            repository_name: repository_name.into(),
            options: PublishOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PublishOptions) -> Self {
        self.options = options;
        self
    }

    pub fn service(&self) -> &G {
        &self.service
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    /// Archive `request.content` and return where it landed.
    pub async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishReceipt, PublishError> {
        let project = self.project.as_str();

        tracing::debug!(phase = %PublishPhase::Provisioning, repository = %self.repository_name);
        let provisioned = get_or_create(&self.service, project, &self.repository_name)
            .await
            .map_err(PublishError::remote(PublishPhase::Provisioning))?;
        let created_repository = provisioned.was_created();
        let repository = provisioned.into_repository();

        let path = ArtifactPath::new(request.run, request.token);
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            tracing::debug!(phase = %PublishPhase::ResolvingTip, attempt = attempts);
            let tip = resolve_tip(&self.service, project, &repository.id)
                .await
                .map_err(PublishError::remote(PublishPhase::ResolvingTip))?;

            tracing::debug!(phase = %PublishPhase::BuildingPush, path = %path);
            let push = build_push(request.report_name, request.content, &tip, &repository, &path);

            tracing::debug!(phase = %PublishPhase::Submitting, old_object_id = %tip);
            match self.service.submit_push(project, &repository.id, &push).await {
                Ok(result) => {
                    let new_tip = result.new_tip(DEFAULT_BRANCH).cloned();
                    tracing::info!(
                        repository = %repository.name,
                        path = %path,
                        push_id = ?result.push_id,
                        attempts,
                        "report published"
                    );
                    return Ok(PublishReceipt {
                        repository,
                        created_repository,
                        path,
                        previous_tip: tip,
                        new_tip,
                        push_id: result.push_id,
                        attempts,
                    });
                }
                Err(source) if source.is_conflict() => {
                    if attempts > self.options.conflict_retries {
                        return Err(PublishError::Conflict {
                            branch: DEFAULT_BRANCH,
                            expected: tip,
                            attempts,
                            source,
                        });
                    }
                    tracing::warn!(
                        expected = %tip.short(),
                        attempt = attempts,
                        "branch moved before push landed, re-resolving tip"
                    );
                }
                Err(source) => {
                    return Err(PublishError::Remote {
                        phase: PublishPhase::Submitting,
                        source,
                    })
                }
            }
        }
    }
}
