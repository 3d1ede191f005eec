//! # Repository Provisioning
//!
//! Get-or-create by exact name. An existing repository is returned
//! untouched; a missing one is created. Lookup "not found" is the only
//! recovered condition. A name clash on creation (another process created
//! the repository between our lookup and our create) is surfaced as is.

use vault_git_client::{GitApiError, GitRepository};

use crate::service::GitService;

/// Outcome of [`get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    /// The repository already existed.
    Found(GitRepository),
    /// The repository was created by this call.
    Created(GitRepository),
}

impl Provisioned {
    pub fn repository(&self) -> &GitRepository {
        match self {
            Self::Found(repo) | Self::Created(repo) => repo,
        }
    }

    pub fn into_repository(self) -> GitRepository {
        match self {
            Self::Found(repo) | Self::Created(repo) => repo,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Return the repository named `name` in `project`, creating it if absent.
pub async fn get_or_create<G>(service: &G, project: &str, name: &str) -> Result<Provisioned, GitApiError>
where
    G: GitService + ?Sized,
{
    if let Some(repo) = service.repository_by_name(project, name).await? {
        tracing::info!(repository = %repo.name, id = %repo.id, "repository ready");
        return Ok(Provisioned::Found(repo));
    }

    tracing::info!(repository = name, project, "repository not found, creating");
    let repo = service.create_repository(project, name).await?;
    tracing::info!(repository = %repo.name, id = %repo.id, "repository created");
    Ok(Provisioned::Created(repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryGitService, Operation};

    #[tokio::test]
    async fn creates_once_then_finds() {
        let service = InMemoryGitService::new();

        let first = get_or_create(&service, "Fabrikam", "Reports").await.unwrap();
        assert!(first.was_created());

        let second = get_or_create(&service, "Fabrikam", "Reports").await.unwrap();
        assert!(!second.was_created());
        assert_eq!(first.repository(), second.repository());

        let calls = service.calls();
        assert_eq!(calls.create_repository, 1);
        assert_eq!(calls.get_repository, 2);
    }

    #[tokio::test]
    async fn existing_repository_is_returned_unchanged() {
        let service = InMemoryGitService::new();
        let seeded = service.seed_repository("Fabrikam", "Reports");

        let found = get_or_create(&service, "Fabrikam", "Reports").await.unwrap();
        assert_eq!(found, Provisioned::Found(seeded));
        assert_eq!(service.calls().create_repository, 0);
    }

    #[tokio::test]
    async fn same_name_in_other_project_is_distinct() {
        let service = InMemoryGitService::new();
        let a = get_or_create(&service, "A", "Reports").await.unwrap();
        let b = get_or_create(&service, "B", "Reports").await.unwrap();
        assert!(a.was_created() && b.was_created());
        assert_ne!(a.repository().id, b.repository().id);
    }

    #[tokio::test]
    async fn lookup_failure_propagates_without_create() {
        let service = InMemoryGitService::new();
        service.fail_next(Operation::GetRepository, 401, "TF400813: not authorized");

        let err = get_or_create(&service, "Fabrikam", "Reports").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(service.calls().create_repository, 0);
    }

    #[tokio::test]
    async fn duplicate_name_on_create_is_fatal() {
        let service = InMemoryGitService::new();
        service.fail_next(
            Operation::CreateRepository,
            409,
            "TF400948: A Git repository with the name Reports already exists.",
        );

        let err = get_or_create(&service, "Fabrikam", "Reports").await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(service.calls().create_repository, 1);
    }
}
