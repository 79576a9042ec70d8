//! Inventory container and statistics.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::node::{FolderNode, InventoryNode};

/// Summary statistics for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    /// Catalog files emitted.
    pub total_files: u64,
    /// Non-empty folders emitted.
    pub total_folders: u64,
    /// Files skipped for their extension, plus symlinks and special files.
    pub skipped_entries: u64,
    /// Entries matched by the ignore set.
    pub ignored_entries: u64,
    /// Directories that could not be listed.
    pub unreadable_dirs: u64,
    /// Deepest directory level visited (root children are level 1).
    pub max_depth: u32,
}

impl InventoryStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visited directory level.
    pub fn record_depth(&mut self, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record an entry the allow-list rejected.
    pub fn record_skipped(&mut self) {
        self.skipped_entries += 1;
    }

    /// Record an ignored entry.
    pub fn record_ignored(&mut self) {
        self.ignored_entries += 1;
    }

    /// Record a directory that could not be listed.
    pub fn record_unreadable(&mut self) {
        self.unreadable_dirs += 1;
    }
}

/// A completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Top-level folder; its totals are the scan's tallies.
    pub root: FolderNode,

    /// Root path that was scanned.
    pub root_path: PathBuf,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Summary statistics.
    pub stats: InventoryStats,

    /// Warnings encountered during scan.
    pub warnings: Vec<ScanWarning>,
}

impl Inventory {
    /// Create a new inventory.
    pub fn new(
        root: FolderNode,
        root_path: PathBuf,
        stats: InventoryStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root,
            root_path,
            scan_duration,
            stats,
            warnings,
        }
    }

    /// Get the total number of catalog files.
    pub fn total_files(&self) -> u64 {
        self.root.total_files
    }

    /// Get the total number of folders below the root.
    pub fn total_folders(&self) -> u64 {
        self.root.total_folders
    }

    /// Top-level entries.
    pub fn children(&self) -> &[InventoryNode] {
        &self.root.children
    }

    /// True when the scan found no catalog files at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The part of the inventory that is published; scan metadata stays out.
    pub fn to_document(&self) -> &FolderNode {
        &self.root
    }
}
