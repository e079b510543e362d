use crate::models::error::BackupError;
use std::path::PathBuf;

/// Outcome of one pass over the backup directory.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Deleted, or in a dry run the files that would have been deleted
    pub deleted: Vec<PathBuf>,
    /// Matching snapshots still inside the retention window
    pub retained: Vec<PathBuf>,
    /// Deletions that failed; the loop carried on past them
    pub failures: Vec<BackupError>,
}

impl PruneReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub snapshot_path: PathBuf,
    pub snapshot_bytes: Option<u64>,
    pub prune: PruneReport,
}
