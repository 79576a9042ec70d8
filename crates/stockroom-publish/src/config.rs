//! Site configuration file (`stockroom.toml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stockroom_core::{
    DEFAULT_EXTENSIONS, DEFAULT_IGNORE_NAMES, DEFAULT_ROOT_NAME, ScanConfig, ScanError,
};
use tracing::debug;

use crate::error::PublishError;
use crate::git::GitOptions;
use crate::rename::RenameOptions;

/// Name of the configuration file looked up in the site root.
pub const CONFIG_FILE_NAME: &str = "stockroom.toml";

/// Page the inventory is injected into when none is configured.
pub const DEFAULT_PAGE: &str = "index.html";

/// Per-site settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Storefront page, relative to the site root.
    pub page: PathBuf,
    /// Name of the top-level folder node.
    pub root_name: String,
    /// Names skipped entirely (exact match).
    pub ignore: Vec<String>,
    /// Extensions that become catalog entries.
    pub extensions: Vec<String>,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Include entries whose names start with a dot.
    pub include_hidden: bool,
    /// Maximum folder depth to scan.
    pub max_depth: Option<u32>,
    /// Commit and push settings.
    pub git: GitOptions,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            page: PathBuf::from(DEFAULT_PAGE),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            ignore: DEFAULT_IGNORE_NAMES.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            git: GitOptions::default(),
        }
    }
}

impl SiteConfig {
    /// Load `stockroom.toml` from the site root, or defaults if there is none.
    pub fn load(root: &Path) -> Result<Self, PublishError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            debug!(path = %path.display(), "no site config, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load a configuration file that must exist.
    pub fn from_file(path: &Path) -> Result<Self, PublishError> {
        let text = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        let config = Self::from_toml_str(&text).map_err(|e| PublishError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded site config");
        Ok(config)
    }

    /// Parse configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Absolute location of the storefront page.
    pub fn page_path(&self, root: &Path) -> PathBuf {
        root.join(&self.page)
    }

    /// Build the scan configuration for `root`.
    pub fn scan_config(&self, root: &Path) -> Result<ScanConfig, ScanError> {
        ScanConfig::builder()
            .root(root)
            .root_name(self.root_name.as_str())
            .ignore_names(self.ignore.iter().cloned())
            .allowed_extensions(&self.extensions)
            .follow_symlinks(self.follow_symlinks)
            .include_hidden(self.include_hidden)
            .max_depth(self.max_depth)
            .build()
            .map_err(|e| ScanError::InvalidConfig {
                message: e.to_string(),
            })
    }

    /// Rename policy matching the scan policy.
    pub fn rename_options(&self, root: &Path) -> Result<RenameOptions, ScanError> {
        Ok(RenameOptions::from_scan_config(&self.scan_config(root)?))
    }
}
