//! # vault-git-client -- Typed Rust client for the Azure DevOps Git API
//!
//! Provides typed access to the four Git operations report-vault needs:
//! - **Repositories**: fetch by name, create
//! - **Commits**: query with `$skip`/`$top` paging
//! - **Pushes**: submit an atomic change-set guarded by `oldObjectId`
//!
//! ## API Path Convention
//!
//! Every request targets `{organization}/{project}/_apis/git/repositories/...`
//! and carries `api-version` as a query parameter. For example:
//! `https://dev.azure.com/contoso/Fabrikam/_apis/git/repositories/Reports?api-version=7.1`.
//!
//! ## Status Mapping
//!
//! | Operation | Status | Result |
//! |-----------|--------|--------|
//! | get repository | 404 | `Ok(None)` |
//! | query commits | 404 | `Ok(vec![])` (repository not yet populated) |
//! | create repository / push | 409 | [`GitApiError::Conflict`] |
//! | any | other non-2xx | [`GitApiError::ApiError`] |

pub mod commits;
pub mod config;
pub mod error;
pub mod pushes;
pub mod repositories;
pub(crate) mod retry;

pub use commits::{CommitQuery, GitCommitRef, GitUserDate};
pub use config::DevOpsConfig;
pub use error::GitApiError;
pub use pushes::{
    GitChange, GitCommit, GitItem, GitPush, GitPushResult, GitRefUpdate, GitRepositoryRef,
    ItemContent, ItemContentType, VersionControlChangeType,
};
pub use repositories::{CreateRepositoryRequest, GitRepository, TeamProjectReference};

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

/// Top-level Azure DevOps Git client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct GitClient {
    repositories: repositories::RepositoryClient,
    commits: commits::CommitClient,
    pushes: pushes::PushClient,
}

impl GitClient {
    /// Create a new client from configuration.
    pub fn new(config: DevOpsConfig) -> Result<Self, GitApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let mut auth = reqwest::header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    config.api_token.as_str()
                ))
                .map_err(|_| GitApiError::Config(config::ConfigError::InvalidToken))?;
                auth.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, auth);
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| GitApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let api = ApiBase {
            http,
            organization_url: config.organization_url,
            api_version: config.api_version,
            read_retry: retry::ReadRetry::default(),
        };

        Ok(Self {
            repositories: repositories::RepositoryClient::new(api.clone()),
            commits: commits::CommitClient::new(api.clone()),
            pushes: pushes::PushClient::new(api),
        })
    }

    /// Access the repositories client.
    pub fn repositories(&self) -> &repositories::RepositoryClient {
        &self.repositories
    }

    /// Access the commits client.
    pub fn commits(&self) -> &commits::CommitClient {
        &self.commits
    }

    /// Access the pushes client.
    pub fn pushes(&self) -> &pushes::PushClient {
        &self.pushes
    }
}

/// Shared HTTP client and URL root for the sub-clients.
#[derive(Debug, Clone)]
pub(crate) struct ApiBase {
    pub(crate) http: reqwest::Client,
    organization_url: Url,
    api_version: String,
    read_retry: retry::ReadRetry,
}

impl ApiBase {
    /// Idempotent `GET`, retried on throttling and transport failures.
    pub(crate) async fn get(&self, url: &Url, endpoint: &str) -> Result<reqwest::Response, GitApiError> {
        self.read_retry
            .get(&self.http, url, endpoint)
            .await
            .map_err(|e| GitApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })
    }

    /// Build `{org}/{project}/_apis/git/repositories/{segments...}?api-version=...`.
    ///
    /// Segments are percent-encoded, so project and repository names may
    /// contain spaces.
    pub(crate) fn repositories_url(
        &self,
        project: &str,
        segments: &[&str],
    ) -> Result<Url, GitApiError> {
        let mut url = self.organization_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GitApiError::Config(config::ConfigError::InvalidUrl(
                    "organization_url".into(),
                    "URL cannot carry a path".into(),
                ))
            })?
            .pop_if_empty()
            .push(project)
            .extend(["_apis", "git", "repositories"])
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

/// Turn a non-2xx response into an error, mapping 409 to `Conflict`.
pub(crate) async fn error_for_status(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, GitApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::CONFLICT {
        return Err(GitApiError::Conflict {
            endpoint: endpoint.into(),
            body,
        });
    }
    Err(GitApiError::ApiError {
        endpoint: endpoint.into(),
        status: status.as_u16(),
        body,
    })
}

/// Deserialize a successful response body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<T, GitApiError> {
    resp.json().await.map_err(|e| GitApiError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}
