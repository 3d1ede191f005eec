//! # Push Construction
//!
//! Builds the single-commit, single-file push that archives one report.
//! Pure: no I/O, no clock, no randomness. Equal inputs give equal pushes.

use vault_core::{ArtifactPath, CommitId, DEFAULT_BRANCH};
use vault_git_client::{
    GitChange, GitCommit, GitItem, GitPush, GitRefUpdate, GitRepository, GitRepositoryRef,
    ItemContent, ItemContentType, VersionControlChangeType,
};

/// Push adding `content` at `path` on the default branch of `repository`,
/// expecting the branch to sit at `tip`.
///
/// The commit comment is the report name. A null `tip` creates the branch.
pub fn build_push(
    report_name: &str,
    content: &str,
    tip: &CommitId,
    repository: &GitRepository,
    path: &ArtifactPath,
) -> GitPush {
    GitPush {
        ref_updates: vec![GitRefUpdate {
            name: DEFAULT_BRANCH.to_string(),
            old_object_id: tip.clone(),
            new_object_id: None,
        }],
        commits: vec![GitCommit {
            comment: report_name.to_string(),
            changes: vec![GitChange {
                change_type: VersionControlChangeType::Add,
                item: GitItem {
                    path: path.as_str().to_string(),
                },
                new_content: Some(ItemContent {
                    content: content.to_string(),
                    content_type: ItemContentType::RawText,
                }),
            }],
        }],
        repository: Some(GitRepositoryRef {
            id: repository.id.clone(),
            name: repository.name.clone(),
        }),
    }
}
