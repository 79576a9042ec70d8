//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
///
/// Only failures at the scan root surface here; an unreadable subdirectory
/// becomes a [`ScanWarning`] instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error listing a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// A followed symlink points back into its own ancestry.
    SymlinkLoop,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a directory that could not be listed.
    ///
    /// Permission failures get their own kind so callers can tell them apart
    /// from a directory that vanished mid-walk.
    pub fn unreadable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self {
                message: format!("Permission denied: {}", path.display()),
                path,
                kind: WarningKind::PermissionDenied,
            },
            _ => Self {
                message: format!("Read error: {error}"),
                path,
                kind: WarningKind::ReadError,
            },
        }
    }

    /// Create a symlink loop warning.
    pub fn symlink_loop(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Symlink loop: {}", path.display()),
            path,
            kind: WarningKind::SymlinkLoop,
        }
    }

    /// True for warnings that mean a directory's contents were not read.
    pub fn is_unreadable_dir(&self) -> bool {
        matches!(
            self.kind,
            WarningKind::PermissionDenied | WarningKind::ReadError
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_unreadable_warning_kind() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::unreadable("/test/path", &denied);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(warning.message.contains("Permission denied"));
        assert!(warning.is_unreadable_dir());

        let other = std::io::Error::other("boom");
        let warning = ScanWarning::unreadable("/test/path", &other);
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(warning.is_unreadable_dir());

        assert!(!ScanWarning::symlink_loop("/test/loop").is_unreadable_dir());
    }
}
