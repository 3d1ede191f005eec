//! Publish settings from the agent environment.

use std::collections::HashMap;

/// Repository that holds archived reports unless overridden.
pub const DEFAULT_REPOSITORY_NAME: &str = "DevOps_Vault_Reports_Extension";

pub const VAR_PROJECT: &str = "SYSTEM_TEAMPROJECT";
pub const VAR_REPOSITORY_NAME: &str = "VAULT_REPOSITORY_NAME";
pub const VAR_CONFLICT_RETRIES: &str = "VAULT_CONFLICT_RETRIES";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{} not set", VAR_PROJECT)]
    MissingProject,
    #[error("{} must be a non-negative integer, got {:?}", VAR_CONFLICT_RETRIES, .0)]
    InvalidRetries(String),
}

/// Where and how reports are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Team project that owns the report repository.
    pub project: String,
    pub repository_name: String,
    pub conflict_retries: u32,
}

impl PublishSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let project = non_empty(VAR_PROJECT).ok_or(SettingsError::MissingProject)?;
        let repository_name =
            non_empty(VAR_REPOSITORY_NAME).unwrap_or_else(|| DEFAULT_REPOSITORY_NAME.to_string());
        let conflict_retries = match non_empty(VAR_CONFLICT_RETRIES) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidRetries(raw))?,
            None => 0,
        };

        Ok(Self {
            project,
            repository_name,
            conflict_retries,
        })
    }

    /// Settings for a fixed set of variables.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        Self::from_lookup(|var| vars.get(var).cloned())
    }
}
