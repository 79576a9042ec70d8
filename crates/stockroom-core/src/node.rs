//! Inventory node types.
//!
//! The serialized shape is what the storefront script reads:
//!
//! ```json
//! { "type": "folder", "name": "Singles", "contents": [ ... ], "totalFiles": 3, "totalFolders": 1 }
//! { "type": "file", "name": "Singles/Charizard_$40.jpg", "title": "Charizard_$40" }
//! ```

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A node in the inventory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InventoryNode {
    /// A directory with at least one catalog entry somewhere below it.
    Folder(FolderNode),
    /// A single catalog image.
    File(FileNode),
}

impl InventoryNode {
    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, InventoryNode::Folder(_))
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, InventoryNode::File(_))
    }

    /// Display name: the folder name, or the file's last path component.
    pub fn name(&self) -> &str {
        match self {
            InventoryNode::Folder(folder) => &folder.name,
            InventoryNode::File(file) => file.file_name(),
        }
    }

    /// Number of files this node accounts for (1 for a file).
    pub fn file_count(&self) -> u64 {
        match self {
            InventoryNode::Folder(folder) => folder.total_files,
            InventoryNode::File(_) => 1,
        }
    }

    /// Number of folders below this node, excluding itself.
    pub fn folder_count(&self) -> u64 {
        match self {
            InventoryNode::Folder(folder) => folder.total_folders,
            InventoryNode::File(_) => 0,
        }
    }

    /// Borrow as a folder.
    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            InventoryNode::Folder(folder) => Some(folder),
            InventoryNode::File(_) => None,
        }
    }

    /// Borrow as a file.
    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            InventoryNode::File(file) => Some(file),
            InventoryNode::Folder(_) => None,
        }
    }
}

impl From<FolderNode> for InventoryNode {
    fn from(folder: FolderNode) -> Self {
        InventoryNode::Folder(folder)
    }
}

impl From<FileNode> for InventoryNode {
    fn from(file: FileNode) -> Self {
        InventoryNode::File(file)
    }
}

/// Value of the `type` key on a serialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    fn expect(self, wanted: NodeKind) -> Result<(), String> {
        if self == wanted {
            Ok(())
        } else {
            Err(format!("expected a {wanted:?} node, found {self:?}").to_lowercase())
        }
    }
}

/// A folder and its aggregated subtree counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename = "folder",
    rename_all = "camelCase",
    try_from = "TaggedFolder"
)]
pub struct FolderNode {
    /// Directory name (not full path).
    pub name: CompactString,

    /// Children in byte order of their names.
    #[serde(rename = "contents")]
    pub children: Vec<InventoryNode>,

    /// All file descendants, recursively.
    pub total_files: u64,

    /// All folder descendants, recursively, excluding this folder.
    pub total_folders: u64,
}

impl FolderNode {
    /// Create an empty folder.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            total_files: 0,
            total_folders: 0,
        }
    }

    /// Create a folder from already aggregated parts.
    pub fn with_children(
        name: impl Into<CompactString>,
        children: Vec<InventoryNode>,
        total_files: u64,
        total_folders: u64,
    ) -> Self {
        Self {
            name: name.into(),
            children,
            total_files,
            total_folders,
        }
    }

    /// True when nothing survived filtering below this folder.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Append a child and fold its counts into this folder's totals.
    pub fn push(&mut self, child: impl Into<InventoryNode>) {
        let child = child.into();
        match &child {
            InventoryNode::File(_) => self.total_files += 1,
            InventoryNode::Folder(folder) => {
                self.total_files += folder.total_files;
                self.total_folders += folder.total_folders + 1;
            }
        }
        self.children.push(child);
    }

    /// Recompute totals from the children, recursively.
    pub fn update_counts(&mut self) {
        self.total_files = 0;
        self.total_folders = 0;

        for child in &mut self.children {
            match child {
                InventoryNode::File(_) => self.total_files += 1,
                InventoryNode::Folder(folder) => {
                    folder.update_counts();
                    self.total_files += folder.total_files;
                    self.total_folders += folder.total_folders + 1;
                }
            }
        }
    }

    /// Iterate over every file below this folder, depth-first in child order.
    pub fn files(&self) -> Files<'_> {
        Files {
            stack: vec![self.children.iter()],
        }
    }

    /// Find a direct child folder by name.
    pub fn folder(&self, name: &str) -> Option<&FolderNode> {
        self.children
            .iter()
            .filter_map(InventoryNode::as_folder)
            .find(|folder| folder.name == name)
    }
}

/// Depth-first iterator over the files of a folder.
pub struct Files<'a> {
    stack: Vec<std::slice::Iter<'a, InventoryNode>>,
}

impl<'a> Iterator for Files<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(InventoryNode::File(file)) => return Some(file),
                Some(InventoryNode::Folder(folder)) => self.stack.push(folder.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// A catalog image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "file", try_from = "TaggedFile")]
pub struct FileNode {
    /// Path from the scan root, always `/`-separated.
    #[serde(rename = "name")]
    pub relative_path: String,

    /// File name without its extension.
    pub title: CompactString,
}

impl FileNode {
    /// Create a file node.
    pub fn new(relative_path: impl Into<String>, title: impl Into<CompactString>) -> Self {
        Self {
            relative_path: relative_path.into(),
            title: title.into(),
        }
    }

    /// Last component of the relative path.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Directory part of the relative path (empty at the root).
    pub fn parent_path(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or("")
    }
}

/// Deserialized form of a folder; the `type` key must say `folder`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaggedFolder {
    #[serde(rename = "type")]
    kind: NodeKind,
    name: CompactString,
    contents: Vec<InventoryNode>,
    total_files: u64,
    total_folders: u64,
}

impl TryFrom<TaggedFolder> for FolderNode {
    type Error = String;

    fn try_from(raw: TaggedFolder) -> Result<Self, Self::Error> {
        raw.kind.expect(NodeKind::Folder)?;
        Ok(FolderNode::with_children(
            raw.name,
            raw.contents,
            raw.total_files,
            raw.total_folders,
        ))
    }
}

/// Deserialized form of a file; the `type` key must say `file`.
#[derive(Deserialize)]
struct TaggedFile {
    #[serde(rename = "type")]
    kind: NodeKind,
    name: String,
    title: CompactString,
}

impl TryFrom<TaggedFile> for FileNode {
    type Error = String;

    fn try_from(raw: TaggedFile) -> Result<Self, Self::Error> {
        raw.kind.expect(NodeKind::File)?;
        Ok(FileNode::new(raw.name, raw.title))
    }
}
