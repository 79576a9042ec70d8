//! Inventory scanning engine for stockroom.
//!
//! This crate walks an image directory and builds the inventory tree the
//! storefront page renders.
//!
//! # Overview
//!
//! - **Deterministic**: entries are sorted by name (byte order) at every level
//! - **Single pass**: folder totals are folded upward while the tree is built
//! - **Pruned**: folders with nothing publishable below them are dropped
//! - **Forgiving**: an unreadable subdirectory becomes a warning, not a failure
//!
//! # Example
//!
//! ```rust,no_run
//! use stockroom_scan::{InventoryScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/shop");
//! let scanner = InventoryScanner::new();
//! let inventory = scanner.scan(&config).unwrap();
//!
//! println!("Files: {}", inventory.total_files());
//! println!("Folders: {}", inventory.total_folders());
//! ```
//!
//! The bare traversal contract is also available without a config:
//!
//! ```rust,no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! let ignore: BTreeSet<String> = [".git".to_string()].into();
//! let allowed: BTreeSet<String> = ["jpg".to_string(), "png".to_string()].into();
//! let outcome = stockroom_scan::scan_directory(Path::new("."), &ignore, &allowed).unwrap();
//! println!("{} files in {} folders", outcome.file_count, outcome.folder_count);
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::{InventoryScanner, ScanOutcome, scan_directory};

// Re-export core types for convenience
pub use stockroom_core::{
    FileNode, FolderNode, Inventory, InventoryNode, InventoryStats, ScanConfig, ScanError,
    ScanWarning, WarningKind,
};
