//! Core types for stockroom.
//!
//! This crate provides the data structures shared by the scanner and the
//! publishing helpers: inventory nodes, the inventory container, scan
//! configuration and errors.

mod config;
mod error;
mod node;
mod tree;

pub use config::{
    DEFAULT_EXTENSIONS, DEFAULT_IGNORE_NAMES, DEFAULT_ROOT_NAME, ScanConfig, ScanConfigBuilder,
    normalize_extension,
};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use node::{FileNode, Files, FolderNode, InventoryNode, NodeKind};
pub use tree::{Inventory, InventoryStats};
