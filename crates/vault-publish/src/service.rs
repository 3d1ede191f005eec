//! # Version-Control Service Seam
//!
//! The four remote operations the workflow consumes. Implementations must
//! be `Send + Sync` so a publisher can be shared across tasks.

use async_trait::async_trait;
use vault_core::RepositoryId;
use vault_git_client::{
    CommitQuery, CreateRepositoryRequest, GitApiError, GitClient, GitCommitRef, GitPush,
    GitPushResult, GitRepository,
};

/// Remote Git operations used by the publish workflow.
#[async_trait]
pub trait GitService: Send + Sync {
    /// Fetch a repository by exact name. `Ok(None)` when it does not exist.
    async fn repository_by_name(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<GitRepository>, GitApiError>;

    /// Create a repository with exactly this name.
    async fn create_repository(&self, project: &str, name: &str)
        -> Result<GitRepository, GitApiError>;

    /// Commits of the default branch, newest first.
    async fn query_commits(
        &self,
        project: &str,
        repository: &RepositoryId,
        query: CommitQuery,
    ) -> Result<Vec<GitCommitRef>, GitApiError>;

    /// Submit an atomic push.
    async fn submit_push(
        &self,
        project: &str,
        repository: &RepositoryId,
        push: &GitPush,
    ) -> Result<GitPushResult, GitApiError>;
}

#[async_trait]
impl GitService for GitClient {
    async fn repository_by_name(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<GitRepository>, GitApiError> {
        self.repositories().get_by_name(project, name).await
    }

    async fn create_repository(
        &self,
        project: &str,
        name: &str,
    ) -> Result<GitRepository, GitApiError> {
        self.repositories()
            .create(project, &CreateRepositoryRequest::new(name))
            .await
    }

    async fn query_commits(
        &self,
        project: &str,
        repository: &RepositoryId,
        query: CommitQuery,
    ) -> Result<Vec<GitCommitRef>, GitApiError> {
        self.commits().query(project, repository, &query).await
    }

    async fn submit_push(
        &self,
        project: &str,
        repository: &RepositoryId,
        push: &GitPush,
    ) -> Result<GitPushResult, GitApiError> {
        self.pushes().create(project, repository, push).await
    }
}
