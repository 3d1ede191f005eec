//! Azure DevOps client configuration.
//!
//! The organization URL and bearer token come from the pipeline agent's
//! environment. Override via explicit construction for staging/testing.

use url::Url;
use zeroize::Zeroizing;

/// Default REST API version appended to every request.
pub const DEFAULT_API_VERSION: &str = "7.1";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to an Azure DevOps organization.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct DevOpsConfig {
    /// Organization (collection) URL, e.g. `https://dev.azure.com/contoso/`.
    pub organization_url: Url,
    /// Bearer token (the job's `System.AccessToken` or a PAT).
    pub api_token: Zeroizing<String>,
    /// Value of the `api-version` query parameter.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsConfig")
            .field("organization_url", &self.organization_url)
            .field("api_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DevOpsConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SYSTEM_COLLECTIONURI` (required)
    /// - `SYSTEM_ACCESSTOKEN` (required)
    /// - `VAULT_API_VERSION` (default: `7.1`)
    /// - `VAULT_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("SYSTEM_COLLECTIONURI")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingOrganization)?;
        let api_token = lookup("SYSTEM_ACCESSTOKEN")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            organization_url: parse_url("SYSTEM_COLLECTIONURI", raw_url.trim())?,
            api_token: Zeroizing::new(api_token),
            api_version: lookup("VAULT_API_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout_secs: lookup("VAULT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    pub fn local_mock(uri: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            organization_url: parse_url("local_mock", uri)?,
            api_token: Zeroizing::new(token.to_string()),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 5,
        })
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "URL cannot carry a path".to_string(),
        ));
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SYSTEM_COLLECTIONURI environment variable is required")]
    MissingOrganization,
    #[error("SYSTEM_ACCESSTOKEN environment variable is required")]
    MissingToken,
    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
