//! # Run Context
//!
//! Identity of the release run that is publishing a report. The four
//! identifiers become segments of the archived artifact path, so each one
//! must be non-empty, free of `/`, and not `.` or `..`.
//!
//! The context is an explicit value handed to the publisher. Only
//! [`RunContext::from_env`] touches the process environment; tests build it
//! with [`RunContext::new`] or [`RunContext::from_lookup`].

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::RunContextError;

/// Release definition id variable.
pub const VAR_DEFINITION_ID: &str = "RELEASE_DEFINITIONID";
/// Release id variable.
pub const VAR_RELEASE_ID: &str = "RELEASE_RELEASEID";
/// Definition environment id variable.
pub const VAR_ENVIRONMENT_ID: &str = "RELEASE_DEFINITIONENVIRONMENTID";
/// Deployment attempt number variable.
pub const VAR_ATTEMPT_NUMBER: &str = "RELEASE_ATTEMPTNUMBER";
/// Default working directory variable.
pub const VAR_WORKING_DIRECTORY: &str = "SYSTEM_DEFAULTWORKINGDIRECTORY";

/// Identity and working directory of the current release run.
///
/// Only constructible through [`RunContext::new`] and friends, so every
/// value in hand has validated components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    definition_id: String,
    release_id: String,
    environment_id: String,
    attempt_number: String,
    working_dir: PathBuf,
}

impl RunContext {
    /// Build a context from explicit values, validating each path component.
    pub fn new(
        definition_id: impl Into<String>,
        release_id: impl Into<String>,
        environment_id: impl Into<String>,
        attempt_number: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, RunContextError> {
        Ok(Self {
            definition_id: component(VAR_DEFINITION_ID, definition_id.into())?,
            release_id: component(VAR_RELEASE_ID, release_id.into())?,
            environment_id: component(VAR_ENVIRONMENT_ID, environment_id.into())?,
            attempt_number: component(VAR_ATTEMPT_NUMBER, attempt_number.into())?,
            working_dir: working_dir.into(),
        })
    }

    /// Read the context from the agent's environment variables.
    pub fn from_env() -> Result<Self, RunContextError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the context through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, RunContextError> {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(RunContextError::Missing(var))
        };

        Self::new(
            required(VAR_DEFINITION_ID)?,
            required(VAR_RELEASE_ID)?,
            required(VAR_ENVIRONMENT_ID)?,
            required(VAR_ATTEMPT_NUMBER)?,
            PathBuf::from(required(VAR_WORKING_DIRECTORY)?),
        )
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    pub fn attempt_number(&self) -> &str {
        &self.attempt_number
    }

    /// Where the local attachment copy is written.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

fn component(var: &'static str, value: String) -> Result<String, RunContextError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(RunContextError::Missing(var));
    }
    if value.contains('/') || value == "." || value == ".." {
        return Err(RunContextError::InvalidComponent { var, value });
    }
    Ok(value)
}
