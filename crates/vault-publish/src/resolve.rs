//! # Commit Resolution
//!
//! The tip of the default branch is the optimistic-concurrency token for the
//! next push. A repository without commits resolves to the null commit.

use vault_core::{CommitId, RepositoryId};
use vault_git_client::{CommitQuery, GitApiError};

use crate::service::GitService;

/// Most recent commit of `repository`, or [`CommitId::null`] when empty.
pub async fn resolve_tip<G>(
    service: &G,
    project: &str,
    repository: &RepositoryId,
) -> Result<CommitId, GitApiError>
where
    G: GitService + ?Sized,
{
    let commits = service
        .query_commits(project, repository, CommitQuery::latest())
        .await?;

    match commits.into_iter().next() {
        Some(commit) => {
            tracing::info!(tip = %commit.commit_id, "resolved tip commit");
            Ok(commit.commit_id)
        }
        None => {
            tracing::info!("repository has no commits, using null commit");
            Ok(CommitId::null())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryGitService, Operation};

    #[tokio::test]
    async fn empty_repository_resolves_to_null_commit() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("Fabrikam", "Reports");

        let tip = resolve_tip(&service, "Fabrikam", &repo.id).await.unwrap();
        assert!(tip.is_null());
        assert_eq!(tip.as_str(), "0000000000000000000000000000000000000000");
    }

    #[tokio::test]
    async fn resolves_most_recent_commit() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("Fabrikam", "Reports");
        let first = service.land_commit("Fabrikam", "Reports", "/a.html", "a");
        let second = service.land_commit("Fabrikam", "Reports", "/b.html", "b");
        assert_ne!(first, second);

        let tip = resolve_tip(&service, "Fabrikam", &repo.id).await.unwrap();
        assert_eq!(tip, second);
    }

    #[tokio::test]
    async fn queries_a_single_commit_page() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("Fabrikam", "Reports");
        resolve_tip(&service, "Fabrikam", &repo.id).await.unwrap();
        assert_eq!(service.last_commit_query(), Some(CommitQuery { skip: 0, top: 1 }));
    }

    #[tokio::test]
    async fn query_failure_propagates() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("Fabrikam", "Reports");
        service.fail_next(Operation::QueryCommits, 500, "boom");

        let err = resolve_tip(&service, "Fabrikam", &repo.id).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
