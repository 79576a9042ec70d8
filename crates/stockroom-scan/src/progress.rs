//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Catalog files emitted so far.
    pub files_scanned: u64,
    /// Directories listed so far.
    pub dirs_scanned: u64,
    /// Entries skipped by the allow-list or the ignore set.
    pub entries_skipped: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub warnings_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
    /// True for the last snapshot of a scan.
    pub finished: bool,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            dirs_scanned: 0,
            entries_skipped: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total entries looked at (files, dirs and skipped entries).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned + self.entries_skipped
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files_scanned: u64,
    dirs_scanned: u64,
    entries_skipped: u64,
    warnings_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files_scanned: 0,
            dirs_scanned: 0,
            entries_skipped: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_file(&mut self) {
        self.files_scanned += 1;
    }

    pub fn record_dir(&mut self, path: PathBuf) {
        self.dirs_scanned += 1;
        self.current_path = path;
    }

    pub fn record_skipped(&mut self) {
        self.entries_skipped += 1;
    }

    pub fn record_warning(&mut self) {
        self.warnings_count += 1;
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, finished: bool) -> ScanProgress {
        ScanProgress {
            files_scanned: self.files_scanned,
            dirs_scanned: self.dirs_scanned,
            entries_skipped: self.entries_skipped,
            current_path: self.current_path.clone(),
            warnings_count: self.warnings_count,
            elapsed: self.start_time.elapsed(),
            finished,
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_snapshot() {
        let mut tracker = ProgressTracker::new();
        tracker.record_dir(PathBuf::from("/srv/shop/Singles"));
        tracker.record_file();
        tracker.record_file();
        tracker.record_skipped();
        tracker.record_warning();

        let snapshot = tracker.snapshot(true);
        assert_eq!(snapshot.files_scanned, 2);
        assert_eq!(snapshot.dirs_scanned, 1);
        assert_eq!(snapshot.entries_skipped, 1);
        assert_eq!(snapshot.warnings_count, 1);
        assert_eq!(snapshot.total_items(), 4);
        assert_eq!(snapshot.current_path, PathBuf::from("/srv/shop/Singles"));
        assert!(snapshot.finished);
    }

    #[test]
    fn test_files_per_second_zero_elapsed() {
        let progress = ScanProgress::new();
        assert_eq!(progress.files_per_second(), 0.0);
    }
}
