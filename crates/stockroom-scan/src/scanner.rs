//! Serial jwalk scanner that folds the inventory tree.
//!
//! The walk streams entries depth-first in name order. Each directory stays
//! open on a stack while its entries arrive; once the stream moves back up,
//! the directory is closed: dropped if nothing survived below it, otherwise
//! appended to its parent with its counts folded in.

use std::collections::BTreeSet;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use stockroom_core::{
    FileNode, FolderNode, Inventory, InventoryNode, InventoryStats, ScanConfig, ScanError,
    ScanWarning, WarningKind, normalize_extension,
};

use crate::progress::{ProgressTracker, ScanProgress};

/// A progress snapshot is broadcast every this many catalog files.
const PROGRESS_INTERVAL: u64 = 100;

/// Children and tallies of one scanned directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Surviving entries in name order.
    pub children: Vec<InventoryNode>,
    /// All catalog files below the directory.
    pub file_count: u64,
    /// All non-empty folders below the directory.
    pub folder_count: u64,
}

impl ScanOutcome {
    /// True when nothing survived filtering.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Wrap as a named folder node.
    pub fn into_folder(self, name: impl Into<CompactString>) -> FolderNode {
        FolderNode::with_children(name, self.children, self.file_count, self.folder_count)
    }
}

impl From<FolderNode> for ScanOutcome {
    fn from(folder: FolderNode) -> Self {
        Self {
            children: folder.children,
            file_count: folder.total_files,
            folder_count: folder.total_folders,
        }
    }
}

/// Scan `root` with an explicit policy and default options.
///
/// Extensions may be given with or without a leading dot, in any case.
pub fn scan_directory(
    root: &Path,
    ignore_names: &BTreeSet<String>,
    allowed_extensions: &BTreeSet<String>,
) -> Result<ScanOutcome, ScanError> {
    let config = ScanConfig {
        ignore_names: ignore_names.clone(),
        allowed_extensions: allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect(),
        ..ScanConfig::new(root)
    };
    let inventory = InventoryScanner::new().scan(&config)?;
    Ok(inventory.root.into())
}

/// Sequential scanner that builds the inventory tree.
pub struct InventoryScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl InventoryScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Perform a scan of `config.root`.
    ///
    /// Fails only when the root itself cannot be listed. Unreadable
    /// subdirectories are recorded as warnings and contribute nothing.
    pub fn scan(&self, config: &ScanConfig) -> Result<Inventory, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        // The walker reports an unreadable root as a warning; it must fail here.
        std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

        let ignored = Arc::new(AtomicU64::new(0));
        let mut fold = Fold::new(config, &self.progress_tx);
        fold.progress.record_dir(root_path.clone());

        for entry_result in self.walker(config, &root_path, Arc::clone(&ignored)) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    fold_error(&mut fold, &err);
                    continue;
                }
            };

            let depth = entry.depth();
            if depth == 0 {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            fold.entry(depth, name, &entry.path(), entry.file_type().into());
        }

        let Folded {
            outcome,
            mut stats,
            warnings,
            progress,
        } = fold.finish();
        stats.total_files = outcome.file_count;
        stats.total_folders = outcome.folder_count;
        stats.ignored_entries = ignored.load(Ordering::Relaxed);
        let _ = self.progress_tx.send(progress.snapshot(true));

        debug!(
            root = %root_path.display(),
            files = outcome.file_count,
            folders = outcome.folder_count,
            warnings = warnings.len(),
            elapsed_ms = progress.elapsed().as_millis() as u64,
            "inventory scan finished"
        );

        Ok(Inventory::new(
            outcome.into_folder(config.root_name.clone()),
            root_path,
            stats,
            start.elapsed(),
            warnings,
        ))
    }

    /// Serial, name-sorted walk with ignored names cut before descent.
    ///
    /// Directories at `max_depth` are listed so their files count; deeper
    /// directories show up as entries only and are skipped by the fold.
    fn walker(&self, config: &ScanConfig, root: &Path, ignored: Arc<AtomicU64>) -> WalkDir {
        let policy = config.clone();
        WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map_or(usize::MAX, |d| d as usize + 1))
            .process_read_dir(move |depth, _path, _state, children| {
                // The first call carries the root itself.
                if depth.is_none() {
                    return;
                }
                children.retain(|entry| match entry {
                    Ok(entry) if policy.should_ignore(&entry.file_name.to_string_lossy()) => {
                        debug!(path = %entry.path().display(), "ignored");
                        ignored.fetch_add(1, Ordering::Relaxed);
                        false
                    }
                    _ => true,
                });
            })
    }
}

impl Default for InventoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Route a walker error to the matching warning.
fn fold_error(fold: &mut Fold<'_>, err: &jwalk::Error) {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    if err.loop_ancestor().is_some() {
        fold.symlink_loop(&path);
    } else if let Some(io_err) = err.io_error().filter(|_| path.is_dir()) {
        fold.unreadable_dir(&path, io_err);
    } else {
        fold.unreadable_entry(&path, err.to_string());
    }
}

/// A directory whose entries are still arriving.
struct OpenFolder {
    name: String,
    rel_path: String,
    depth: usize,
    outcome: ScanOutcome,
}

/// Result of a finished fold.
struct Folded {
    outcome: ScanOutcome,
    stats: InventoryStats,
    warnings: Vec<ScanWarning>,
    progress: ProgressTracker,
}

/// Folds a depth-first, name-sorted entry stream into a tree.
struct Fold<'a> {
    config: &'a ScanConfig,
    /// Open directories, root first. The root is never closed early.
    open: Vec<OpenFolder>,
    stats: InventoryStats,
    warnings: Vec<ScanWarning>,
    progress: ProgressTracker,
    progress_tx: &'a broadcast::Sender<ScanProgress>,
}

impl<'a> Fold<'a> {
    fn new(config: &'a ScanConfig, progress_tx: &'a broadcast::Sender<ScanProgress>) -> Self {
        Self {
            config,
            open: vec![OpenFolder {
                name: String::new(),
                rel_path: String::new(),
                depth: 0,
                outcome: ScanOutcome::default(),
            }],
            stats: InventoryStats::new(),
            warnings: Vec::new(),
            progress: ProgressTracker::new(),
            progress_tx,
        }
    }

    /// Fold one entry. `depth` is 1 for children of the root.
    fn entry(&mut self, depth: usize, name: String, path: &Path, kind: EntryKind) {
        self.close_from(depth);

        let rel_path = match self.open.last() {
            Some(parent) if !parent.rel_path.is_empty() => format!("{}/{name}", parent.rel_path),
            _ => name.clone(),
        };

        match kind {
            EntryKind::Directory => {
                if !self.config.within_depth(depth as u32) {
                    debug!(path = %path.display(), "below max depth");
                    self.skip();
                    return;
                }
                self.stats.record_depth(depth as u32);
                self.progress.record_dir(path.to_path_buf());
                self.open.push(OpenFolder {
                    name,
                    rel_path,
                    depth,
                    outcome: ScanOutcome::default(),
                });
            }
            EntryKind::File if self.config.is_allowed(&name) => {
                let title = Path::new(&name)
                    .file_stem()
                    .map(|stem| CompactString::from(stem.to_string_lossy()))
                    .unwrap_or_default();
                if let Some(parent) = self.open.last_mut() {
                    parent.outcome.children.push(FileNode::new(rel_path, title).into());
                    parent.outcome.file_count += 1;
                }
                self.record_file();
            }
            EntryKind::File | EntryKind::Other => self.skip(),
        }
    }

    /// A directory could not be listed. It stays open and is pruned as empty.
    fn unreadable_dir(&mut self, path: &Path, err: &std::io::Error) {
        warn!(path = %path.display(), error = %err, "skipping unreadable directory");
        self.stats.record_unreadable();
        self.push_warning(ScanWarning::unreadable(path, err));
    }

    /// A single entry could not be inspected; its siblings are unaffected.
    fn unreadable_entry(&mut self, path: &Path, message: String) {
        warn!(path = %path.display(), error = %message, "skipping unreadable entry");
        self.push_warning(ScanWarning::new(path, message, WarningKind::MetadataError));
    }

    fn symlink_loop(&mut self, path: &Path) {
        warn!(path = %path.display(), "skipping symlink loop");
        self.push_warning(ScanWarning::symlink_loop(path));
    }

    /// Close every open directory at `depth` or deeper.
    fn close_from(&mut self, depth: usize) {
        while self.open.len() > 1 && self.open.last().is_some_and(|f| f.depth >= depth) {
            let Some(folder) = self.open.pop() else {
                break;
            };
            let Some(parent) = self.open.last_mut() else {
                break;
            };
            if folder.outcome.is_empty() {
                continue;
            }
            parent.outcome.file_count += folder.outcome.file_count;
            parent.outcome.folder_count += 1 + folder.outcome.folder_count;
            parent
                .outcome
                .children
                .push(folder.outcome.into_folder(folder.name).into());
        }
    }

    fn finish(mut self) -> Folded {
        self.close_from(1);
        let outcome = self.open.pop().map(|root| root.outcome).unwrap_or_default();
        Folded {
            outcome,
            stats: self.stats,
            warnings: self.warnings,
            progress: self.progress,
        }
    }

    fn push_warning(&mut self, warning: ScanWarning) {
        self.progress.record_warning();
        self.warnings.push(warning);
    }

    fn skip(&mut self) {
        self.stats.record_skipped();
        self.progress.record_skipped();
    }

    fn record_file(&mut self) {
        self.progress.record_file();
        if self.progress.files_scanned() % PROGRESS_INTERVAL == 0 {
            let _ = self.progress_tx.send(self.progress.snapshot(false));
        }
    }
}

/// What the fold does with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}
