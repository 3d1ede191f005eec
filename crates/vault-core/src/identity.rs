//! # Identifier Newtypes
//!
//! Newtype wrappers for the identifiers exchanged with the hosting service.
//! A `RepositoryId` cannot be passed where a `CommitId` is expected, and a
//! `CommitId` is validated once at the boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommitIdError;

/// The conventional "null commit": the expected prior tip of a branch that
/// does not exist yet.
pub const NULL_COMMIT: &str = "0000000000000000000000000000000000000000";

/// The branch every report is pushed to.
pub const DEFAULT_BRANCH: &str = "refs/heads/master";

const COMMIT_ID_LEN: usize = 40;

/// A 40-character lowercase hex commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Parse and normalize a commit id. Uppercase hex is accepted and
    /// lowercased.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CommitIdError> {
        let raw = raw.as_ref();
        if raw.len() != COMMIT_ID_LEN {
            return Err(CommitIdError::InvalidLength(raw.len()));
        }
        if let Some((offset, ch)) = raw.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(CommitIdError::InvalidCharacter { ch, offset });
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// The all-zero sentinel used as `oldObjectId` for an empty repository.
    pub fn null() -> Self {
        Self(NULL_COMMIT.to_string())
    }

    /// Whether this is the all-zero sentinel.
    pub fn is_null(&self) -> bool {
        self.0 == NULL_COMMIT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl FromStr for CommitId {
    type Err = CommitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = CommitIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommitId> for String {
    fn from(value: CommitId) -> Self {
        value.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque repository identifier assigned by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(pub String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_commit_is_forty_zeros() {
        let null = CommitId::null();
        assert_eq!(null.as_str().len(), 40);
        assert!(null.as_str().chars().all(|c| c == '0'));
        assert!(null.is_null());
    }

    #[test]
    fn parses_and_lowercases() {
        let id = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC123DE").unwrap();
        assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc123de");
        assert_eq!(id.short(), "abc123d");
        assert!(!id.is_null());
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(CommitId::new("abc123"), Err(CommitIdError::InvalidLength(6)));
        assert_eq!(CommitId::new(""), Err(CommitIdError::InvalidLength(0)));
    }

    #[test]
    fn rejects_non_hex() {
        let err = CommitId::new("g000000000000000000000000000000000000000").unwrap_err();
        assert_eq!(err, CommitIdError::InvalidCharacter { ch: 'g', offset: 0 });
    }

    #[test]
    fn serde_uses_plain_string() {
        let id = CommitId::new("abc123def4567890abc123def4567890abc123de").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123def4567890abc123def4567890abc123de\"");
        let back: CommitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn serde_rejects_malformed_commit() {
        let result: Result<CommitId, _> = serde_json::from_str("\"not-a-commit\"");
        assert!(result.is_err());
    }

    #[test]
    fn repository_id_is_transparent() {
        let id = RepositoryId::new("5febef5a-833d-4e14-b9c0-14cb638f91e6");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"5febef5a-833d-4e14-b9c0-14cb638f91e6\""
        );
        assert_eq!(id.to_string(), "5febef5a-833d-4e14-b9c0-14cb638f91e6");
    }
}
