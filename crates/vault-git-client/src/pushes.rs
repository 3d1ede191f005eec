//! Typed client for Git pushes.
//!
//! | Method | Path (relative to `{org}/{project}/_apis/git`) | Operation |
//! |--------|-----------------------------------------------|-----------|
//! | POST   | `/repositories/{repositoryId}/pushes` | Create push |
//!
//! A push is atomic: every commit lands as one ref update or nothing does.
//! Each [`GitRefUpdate`] carries the `oldObjectId` the caller last saw; the
//! service answers 409 when the ref has moved since.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_core::{CommitId, RepositoryId};

use crate::commits::GitCommitRef;
use crate::error::GitApiError;
use crate::ApiBase;

/// Kind of change applied to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionControlChangeType {
    Add,
    Edit,
    Delete,
}

/// Encoding of [`ItemContent::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemContentType {
    RawText,
    Base64Encoded,
}

/// Path of the item a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitItem {
    pub path: String,
}

/// New content of an added or edited item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemContent {
    pub content: String,
    pub content_type: ItemContentType,
}

/// One file change inside a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitChange {
    pub change_type: VersionControlChangeType,
    pub item: GitItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_content: Option<ItemContent>,
}

/// A commit to create as part of a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub comment: String,
    pub changes: Vec<GitChange>,
}

/// Expected and resulting position of a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRefUpdate {
    pub name: String,
    pub old_object_id: CommitId,
    /// Filled in by the service in push responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_object_id: Option<CommitId>,
}

/// Repository reference embedded in a push body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepositoryRef {
    pub id: RepositoryId,
    pub name: String,
}

/// Request body for `POST /pushes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPush {
    pub ref_updates: Vec<GitRefUpdate>,
    pub commits: Vec<GitCommit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<GitRepositoryRef>,
}

/// Push as accepted by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPushResult {
    #[serde(default)]
    pub push_id: Option<u64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commits: Vec<GitCommitRef>,
    #[serde(default)]
    pub ref_updates: Vec<GitRefUpdate>,
}

impl GitPushResult {
    /// New tip of `ref_name` after the push, if the service reported it.
    pub fn new_tip(&self, ref_name: &str) -> Option<&CommitId> {
        self.ref_updates
            .iter()
            .find(|u| u.name == ref_name)
            .and_then(|u| u.new_object_id.as_ref())
            .or_else(|| self.commits.first().map(|c| &c.commit_id))
    }
}

/// Client for Git pushes.
#[derive(Debug, Clone)]
pub struct PushClient {
    api: ApiBase,
}

impl PushClient {
    pub(crate) fn new(api: ApiBase) -> Self {
        Self { api }
    }

    /// Submit a push.
    ///
    /// Calls `POST {org}/{project}/_apis/git/repositories/{id}/pushes`. A
    /// stale `oldObjectId` surfaces as [`GitApiError::Conflict`]. Never
    /// retried.
    pub async fn create(
        &self,
        project: &str,
        repository: &RepositoryId,
        push: &GitPush,
    ) -> Result<GitPushResult, GitApiError> {
        let endpoint = format!("POST /repositories/{repository}/pushes");
        let url = self
            .api
            .repositories_url(project, &[repository.as_str(), "pushes"])?;

        tracing::debug!(%url, commits = push.commits.len(), "submitting push");
        let resp = self
            .api
            .http
            .post(url)
            .json(push)
            .send()
            .await
            .map_err(|e| GitApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let resp = crate::error_for_status(resp, &endpoint).await?;
        crate::read_json(resp, &endpoint).await
    }
}
