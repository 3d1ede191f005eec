//! # Error Types
//!
//! Validation errors for the core value types. Remote and workflow errors
//! live in the crates that produce them.

use thiserror::Error;

/// A string could not be accepted as a commit id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitIdError {
    /// Commit ids are exactly 40 hex characters.
    #[error("commit id must be 40 hex characters, got {0}")]
    InvalidLength(usize),

    /// A non-hex character was found.
    #[error("commit id contains non-hex character {ch:?} at offset {offset}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        offset: usize,
    },
}

/// The run context could not be assembled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunContextError {
    /// A required variable is unset or blank.
    #[error("run context variable {0} is not set")]
    Missing(&'static str),

    /// A path component would break the artifact path layout.
    #[error("run context variable {var} must be a single path segment: {value}")]
    InvalidComponent {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
}
