//! Filename normalization.
//!
//! Image names end up in URLs on the storefront page, so spaces in them are
//! replaced with underscores before publishing.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use serde::{Deserialize, Serialize};
use stockroom_core::{ScanConfig, normalize_extension};
use tracing::{info, warn};

use crate::error::{OperationError, PublishError};

/// Which files are normalized and whether to touch the disk.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    /// Extensions eligible for renaming: lowercase, no leading dot.
    pub allowed_extensions: BTreeSet<String>,
    /// Names skipped entirely, whether file or directory.
    pub ignore_names: BTreeSet<String>,
    /// Descend into entries whose names start with a dot.
    pub include_hidden: bool,
    /// Report what would change without renaming.
    pub dry_run: bool,
}

impl RenameOptions {
    /// Use the same policy as a scan.
    pub fn from_scan_config(config: &ScanConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.clone(),
            ignore_names: config.ignore_names.clone(),
            include_hidden: config.include_hidden,
            dry_run: false,
        }
    }

    /// Toggle dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn is_allowed(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.allowed_extensions.contains(&normalize_extension(ext)))
    }
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self::from_scan_config(&ScanConfig::default())
    }
}

/// A single completed (or, in dry-run mode, planned) rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renamed {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of [`normalize_filenames`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameReport {
    /// Files renamed, in walk order.
    pub renamed: Vec<Renamed>,
    /// Files left alone because renaming them failed.
    pub failed: Vec<OperationError>,
}

impl RenameReport {
    /// True when nothing needed renaming and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.renamed.is_empty() && self.failed.is_empty()
    }
}

/// The normalized form of `name`, or `None` if it needs no change.
pub fn normalized_name(name: &str) -> Option<String> {
    name.contains(' ').then(|| name.replace(' ', "_"))
}

/// Replace spaces with underscores in every eligible image under `root`.
///
/// Per-file failures (collisions, invalid names, I/O errors) are collected in
/// the report; only an unusable `root` is an error.
pub fn normalize_filenames(
    root: &Path,
    options: &RenameOptions,
) -> Result<RenameReport, PublishError> {
    if !root.is_dir() {
        return Err(PublishError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut report = RenameReport::default();
    // Targets taken earlier in this run; a dry run never creates them on disk.
    let mut claimed = BTreeSet::new();
    for source in candidates(root, options, &mut report) {
        let Some(name) = source.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(new_name) = normalized_name(name) else {
            continue;
        };

        if let Err(message) = validate_filename(&new_name) {
            report.failed.push(OperationError::new(&source, message));
            continue;
        }

        let target = source.with_file_name(&new_name);
        if target.exists() || claimed.contains(&target) {
            warn!(path = %source.display(), "rename target already exists");
            report.failed.push(OperationError::new(
                &source,
                format!("'{new_name}' already exists"),
            ));
            continue;
        }

        if !options.dry_run {
            if let Err(e) = fs::rename(&source, &target) {
                report
                    .failed
                    .push(OperationError::new(&source, format!("Rename failed: {e}")));
                continue;
            }
            info!(from = %source.display(), to = %target.display(), "renamed");
        }

        claimed.insert(target.clone());
        report.renamed.push(Renamed {
            from: source,
            to: target,
        });
    }

    Ok(report)
}

/// Eligible image files whose names contain a space, in sorted walk order.
fn candidates(root: &Path, options: &RenameOptions, report: &mut RenameReport) -> Vec<PathBuf> {
    let ignore = Arc::new(options.ignore_names.clone());
    let walker = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(!options.include_hidden)
        .process_read_dir(move |depth, _path, _state, children| {
            // The first call carries the root itself.
            if depth.is_none() {
                return;
            }
            children.retain(|entry| match entry {
                Ok(entry) => !ignore.contains(&*entry.file_name.to_string_lossy()),
                Err(_) => true,
            });
        });

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                report.failed.push(OperationError::new(path, err.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.contains(' ') && options.is_allowed(&name) {
            paths.push(entry.path());
        }
    }
    paths
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }

    for c in ['/', '\\', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalized_name("Booster Box $120.jpg").as_deref(), Some("Booster_Box_$120.jpg"));
        assert_eq!(normalized_name("already_fine.jpg"), None);
    }

    #[test]
    fn test_validate_filename_valid() {
        assert!(validate_filename("card.jpg").is_ok());
        assert!(validate_filename("Booster_Box_$120.jpg").is_ok());
        assert!(validate_filename(".hidden").is_ok());
    }

    #[test]
    fn test_validate_filename_invalid() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename("a/b.jpg").is_err());
        assert!(validate_filename("a\\b.jpg").is_err());
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("file.").is_err());
        assert!(validate_filename(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_options_extension_match() {
        let options = RenameOptions::default();
        assert!(options.is_allowed("a b.JPG"));
        assert!(options.is_allowed("a b.webp"));
        assert!(!options.is_allowed("a b.txt"));
        assert!(!options.dry_run);
        assert!(options.with_dry_run(true).dry_run);
    }
}
