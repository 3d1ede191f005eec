//! Typed client for Git commits.
//!
//! | Method | Path (relative to `{org}/{project}/_apis/git`) | Operation |
//! |--------|-----------------------------------------------|-----------|
//! | GET    | `/repositories/{repositoryId}/commits` | Query commits, newest first |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_core::{CommitId, RepositoryId};

use crate::error::GitApiError;
use crate::ApiBase;

/// Author or committer stamp on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitUserDate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Commit summary as returned by the commits and pushes endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    pub commit_id: CommitId,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub author: Option<GitUserDate>,
    #[serde(default)]
    pub committer: Option<GitUserDate>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Paging window for a commit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitQuery {
    pub skip: u32,
    pub top: u32,
}

impl CommitQuery {
    /// Only the most recent commit.
    pub fn latest() -> Self {
        Self { skip: 0, top: 1 }
    }
}

#[derive(Debug, Deserialize)]
struct CommitList {
    #[serde(default)]
    value: Vec<GitCommitRef>,
}

/// Client for Git commits.
#[derive(Debug, Clone)]
pub struct CommitClient {
    api: ApiBase,
}

impl CommitClient {
    pub(crate) fn new(api: ApiBase) -> Self {
        Self { api }
    }

    /// Query commits, newest first.
    ///
    /// Calls `GET .../repositories/{id}/commits?searchCriteria.$skip=..&searchCriteria.$top=..`.
    /// A 404 means the repository has no branch yet and yields an empty list.
    pub async fn query(
        &self,
        project: &str,
        repository: &RepositoryId,
        query: &CommitQuery,
    ) -> Result<Vec<GitCommitRef>, GitApiError> {
        let endpoint = format!("GET /repositories/{repository}/commits");
        let mut url = self
            .api
            .repositories_url(project, &[repository.as_str(), "commits"])?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.$skip", &query.skip.to_string())
            .append_pair("searchCriteria.$top", &query.top.to_string());

        tracing::debug!(%url, "querying commits");
        let resp = self.api.get(&url, &endpoint).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let resp = crate::error_for_status(resp, &endpoint).await?;
        let list: CommitList = crate::read_json(resp, &endpoint).await?;
        Ok(list.value)
    }
}
