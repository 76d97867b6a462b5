//! Error taxonomy for the sync engine
//!
//! Every error carries enough context (item id, file path, reason) to be
//! actionable by the content author. Only a filesystem failure at the
//! root-scan level is fatal to a pass; everything else is caught at the
//! item boundary and recorded in the sync report.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Filesystem failure. Fatal when raised during the root scan,
    /// per-item recoverable everywhere else.
    #[error("filesystem error at {path}: {reason}")]
    FileSystem { path: PathBuf, reason: String },

    /// Manifest schema violation: a required field is missing, an enum
    /// value is unknown, or a registered file does not exist.
    #[error("validation failed for '{item}' ({field}): {reason}")]
    Validation {
        item: String,
        field: String,
        reason: String,
    },

    /// Malformed frontmatter or manifest YAML.
    #[error("failed to parse {path}: {reason}")]
    Parsing { path: PathBuf, reason: String },

    /// Database write or transaction failure. Retried once, then caught
    /// at the item boundary and recorded as failed.
    #[error("database error: {0}")]
    Database(String),

    /// On-disk and persisted state both changed since the last sync.
    /// Classified and surfaced through the report, never thrown mid-pass.
    #[error("conflict on '{item}': {reason}")]
    Conflict { item: String, reason: String },

    /// Another sync pass holds the workspace lock.
    #[error("another sync pass is already running (lock file: {0})")]
    LockHeld(PathBuf),
}

impl SyncError {
    /// Builds a filesystem error from an io::Error
    pub fn fs(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        SyncError::FileSystem {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Builds a validation error
    pub fn validation(
        item: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SyncError::Validation {
            item: item.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Builds a parsing error
    pub fn parsing(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SyncError::Parsing {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the item id associated with this error, if any
    pub fn item_id(&self) -> Option<&str> {
        match self {
            SyncError::Validation { item, .. } | SyncError::Conflict { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Returns the file path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            SyncError::FileSystem { path, .. } | SyncError::Parsing { path, .. } => Some(path),
            SyncError::LockHeld(path) => Some(path),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_item_and_field() {
        let err = SyncError::validation("hello-world", "en.md", "file not found");
        let msg = err.to_string();

        assert!(msg.contains("hello-world"));
        assert!(msg.contains("en.md"));
        assert!(msg.contains("file not found"));
        assert_eq!(err.item_id(), Some("hello-world"));
    }

    #[test]
    fn parsing_error_has_no_item_id() {
        let err = SyncError::parsing("/content/blog/post/.silan-cache", "bad YAML");
        assert_eq!(err.item_id(), None);
    }

    #[test]
    fn parsing_error_carries_path() {
        let err = SyncError::parsing("/content/blog/post/en.md", "bad YAML");
        assert_eq!(
            err.path().unwrap(),
            Path::new("/content/blog/post/en.md")
        );
    }

    #[test]
    fn database_error_from_rusqlite() {
        let err: SyncError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, SyncError::Database(_)));
    }
}
