//! Report flattening: turning the report at a path into the single
//! self-contained document that gets archived.

use std::path::{Path, PathBuf};

/// Message shown to pipeline users when a report cannot be read.
pub const CONVERSION_FAILED: &str = "the report could not be converted, validate that the report exists";

/// The report at `path` could not be flattened.
#[derive(Debug, thiserror::Error)]
#[error("{}: {} ({reason})", CONVERSION_FAILED, .path.display())]
pub struct FlattenError {
    pub path: PathBuf,
    pub reason: String,
}

impl FlattenError {
    pub fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Produces a single self-contained HTML document from a report path.
pub trait Flattener: Send + Sync {
    fn flatten(&self, path: &Path) -> Result<String, FlattenError>;
}

impl<F> Flattener for F
where
    F: Fn(&Path) -> Result<String, FlattenError> + Send + Sync,
{
    fn flatten(&self, path: &Path) -> Result<String, FlattenError> {
        self(path)
    }
}

/// Reads an already self-contained HTML file as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFlattener;

impl Flattener for FileFlattener {
    fn flatten(&self, path: &Path) -> Result<String, FlattenError> {
        let meta = std::fs::metadata(path).map_err(|e| FlattenError::new(path, e.to_string()))?;
        if !meta.is_file() {
            return Err(FlattenError::new(path, "not a file"));
        }
        let bytes = std::fs::read(path).map_err(|e| FlattenError::new(path, e.to_string()))?;
        let document =
            String::from_utf8(bytes).map_err(|e| FlattenError::new(path, format!("not UTF-8: {e}")))?;
        if document.trim().is_empty() {
            return Err(FlattenError::new(path, "document is empty"));
        }
        tracing::debug!(path = %path.display(), bytes = document.len(), "report flattened");
        Ok(document)
    }
}
