//! Error types for publishing operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stockroom_core::ScanError;
use thiserror::Error;

/// Errors from injecting, committing, renaming or loading configuration.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The storefront page does not exist.
    #[error("Page not found: {path}")]
    PageNotFound { path: PathBuf },

    /// The page has no inventory assignment to replace.
    #[error("No `const inventoryDB = {{ ... }};` assignment found in {path}")]
    MarkerNotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The inventory could not be encoded.
    #[error("Failed to encode inventory: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A git operation failed.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; no branch to push")]
    DetachedHead,

    /// The site configuration file is malformed.
    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The scan could not run.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl PublishError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A per-file failure that does not stop a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
