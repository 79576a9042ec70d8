//! Scan configuration types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize};

/// Image extensions published by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Names skipped by default, whether file or directory.
pub const DEFAULT_IGNORE_NAMES: &[&str] = &[
    ".git",
    "index.html",
    "update_shop.py",
    "fix_filenames.py",
    ".DS_Store",
    "node_modules",
    "__pycache__",
    "stockroom.toml",
];

/// Name given to the top-level folder of the inventory.
pub const DEFAULT_ROOT_NAME: &str = "Home";

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Name of the top-level folder node.
    #[builder(default = "DEFAULT_ROOT_NAME.into()")]
    #[serde(default = "default_root_name")]
    pub root_name: CompactString,

    /// Names skipped entirely (exact match, not a pattern).
    #[builder(setter(custom), default = "default_ignore_names()")]
    #[serde(default = "default_ignore_names")]
    pub ignore_names: BTreeSet<String>,

    /// Extensions that become catalog entries: lowercase, no leading dot.
    #[builder(setter(custom), default = "default_extensions()")]
    #[serde(
        default = "default_extensions",
        deserialize_with = "deserialize_extensions"
    )]
    pub allowed_extensions: BTreeSet<String>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

fn default_root_name() -> CompactString {
    DEFAULT_ROOT_NAME.into()
}

fn default_ignore_names() -> BTreeSet<String> {
    DEFAULT_IGNORE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_extensions() -> BTreeSet<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().map(|ext| normalize_extension(ext)).collect())
}

/// Lowercase an extension and strip any leading dot, so `".JPG"` and `"jpg"`
/// compare equal.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

impl ScanConfigBuilder {
    /// Replace the ignore set.
    pub fn ignore_names<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the extension allow-list. Entries are normalized.
    pub fn allowed_extensions<I, S>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = Some(
            extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        );
        self
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref extensions) = self.allowed_extensions {
            if extensions.iter().all(|ext| ext.is_empty()) {
                return Err("At least one file extension must be allowed".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with the default policy for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            root_name: default_root_name(),
            ignore_names: default_ignore_names(),
            allowed_extensions: default_extensions(),
            follow_symlinks: false,
            max_depth: None,
            include_hidden: true,
        }
    }

    /// Check if an entry name is excluded from the scan.
    pub fn should_ignore(&self, name: &str) -> bool {
        self.ignore_names.contains(name) || self.should_skip_hidden(name)
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if a file's extension is in the allow-list (case-insensitive).
    pub fn is_allowed(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext.to_lowercase()))
    }

    /// Check whether a directory at `depth` (root children are depth 1) may
    /// be descended into.
    pub fn within_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
