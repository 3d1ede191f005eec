//! # Artifact Paths
//!
//! Every archived report lands at
//! `/{definitionId}/{releaseId}/{environmentId}/{attemptNumber}/{token}.html`.
//! Runs never collide because the run identity is part of the path; two
//! publishes within the same attempt are told apart by the [`ReportToken`].

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::run::RunContext;

/// File extension of archived reports.
pub const REPORT_EXTENSION: &str = "html";

/// Per-invocation token naming the archived file: milliseconds since the
/// Unix epoch at the time the invocation started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportToken(String);

impl ReportToken {
    /// A token for the current instant.
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    /// Wrap a caller-chosen token. Returns `None` when the token is empty or
    /// contains a path separator.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains('/') {
            return None;
        }
        Some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic in-repository path of an archived report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    pub fn new(run: &RunContext, token: &ReportToken) -> Self {
        Self(format!(
            "/{}/{}/{}/{}/{}.{REPORT_EXTENSION}",
            run.definition_id(),
            run.release_id(),
            run.environment_id(),
            run.attempt_number(),
            token
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
