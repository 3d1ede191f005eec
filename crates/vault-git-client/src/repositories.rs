//! Typed client for Git repositories.
//!
//! | Method | Path (relative to `{org}/{project}/_apis/git`) | Operation |
//! |--------|-----------------------------------------------|-----------|
//! | GET    | `/repositories/{repositoryNameOrId}` | Get by name or id |
//! | POST   | `/repositories` | Create repository |

use serde::{Deserialize, Serialize};
use vault_core::RepositoryId;

use crate::error::GitApiError;
use crate::ApiBase;

/// Project a repository belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProjectReference {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Git repository as returned by the service.
///
/// Unknown fields are ignored so the client keeps working as the API
/// grows new properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    pub id: RepositoryId,
    pub name: String,
    #[serde(default)]
    pub project: Option<TeamProjectReference>,
    /// Absent until the first push creates a branch.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Request body for `POST /repositories`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepositoryRequest {
    pub name: String,
}

impl CreateRepositoryRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Client for Git repositories.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    api: ApiBase,
}

impl RepositoryClient {
    pub(crate) fn new(api: ApiBase) -> Self {
        Self { api }
    }

    /// Fetch a repository by exact name.
    ///
    /// Calls `GET {org}/{project}/_apis/git/repositories/{name}`. Returns
    /// `Ok(None)` on 404; every other failure is an error.
    pub async fn get_by_name(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<GitRepository>, GitApiError> {
        let endpoint = format!("GET /repositories/{name}");
        let url = self.api.repositories_url(project, &[name])?;

        tracing::debug!(%url, "fetching repository");
        let resp = self.api.get(&url, &endpoint).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = crate::error_for_status(resp, &endpoint).await?;
        crate::read_json(resp, &endpoint).await.map(Some)
    }

    /// Create a repository in the project.
    ///
    /// Calls `POST {org}/{project}/_apis/git/repositories`. A name clash
    /// surfaces as [`GitApiError::Conflict`].
    pub async fn create(
        &self,
        project: &str,
        req: &CreateRepositoryRequest,
    ) -> Result<GitRepository, GitApiError> {
        let endpoint = "POST /repositories";
        let url = self.api.repositories_url(project, &[])?;

        tracing::debug!(%url, name = %req.name, "creating repository");
        let resp = self
            .api
            .http
            .post(url)
            .json(req)
            .send()
            .await
            .map_err(|e| GitApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let resp = crate::error_for_status(resp, endpoint).await?;
        crate::read_json(resp, endpoint).await
    }
}
