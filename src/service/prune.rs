use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::models::run_report::PruneReport;
use crate::models::snapshot_name::SnapshotPattern;
use crate::utils::directory::get_files_in_dir;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Deletes snapshot files in `dir` whose modification time is more than `retention` before `now`.
///
/// Only regular files directly in `dir` whose names match `pattern` are candidates. A failed
/// deletion is recorded in the report and the remaining candidates are still processed.
pub fn prune_snapshots(
    dir: &Path,
    pattern: &SnapshotPattern,
    retention: Duration,
    now: SystemTime,
    dry_run_mode: DryRunMode,
) -> Result<PruneReport> {
    prune_with(dir, pattern, retention, now, dry_run_mode, |path| {
        fs::remove_file(path)
    })
}

fn prune_with<F>(
    dir: &Path,
    pattern: &SnapshotPattern,
    retention: Duration,
    now: SystemTime,
    dry_run_mode: DryRunMode,
    mut remove: F,
) -> Result<PruneReport>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let prefix = dry_run_mode.log_prefix();
    let mut report = PruneReport::default();

    if dry_run_mode.is_dry_run() && !dir.exists() {
        info!("{}Backup directory does not exist yet, nothing to prune", prefix);
        return Ok(report);
    }

    let cutoff = now.checked_sub(retention).unwrap_or(UNIX_EPOCH);
    info!(
        "{}Pruning snapshots in {} older than {} days",
        prefix,
        dir.display(),
        retention.as_secs() / 86_400
    );

    for file in get_files_in_dir(dir)? {
        let Some(name) = pattern.matches(&file) else {
            debug!("Not a snapshot, leaving alone: {}", file.display());
            continue;
        };

        let modified = match fs::metadata(&file).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(cause) => {
                warn!("Could not read modification time of {}: {}", file.display(), cause);
                report.failures.push(BackupError::PruneFile { path: file, cause });
                continue;
            }
        };

        if modified >= cutoff {
            debug!(
                "Within retention: {} (named for {}{})",
                file.display(),
                name.date,
                name.sequence.map(|n| format!(", #{}", n)).unwrap_or_default()
            );
            report.retained.push(file);
            continue;
        }

        if !dry_run_mode.should_delete_files() {
            info!("{}Would delete {}", prefix, file.display());
            report.deleted.push(file);
            continue;
        }

        match remove(&file) {
            Ok(()) => {
                info!("Deleted expired snapshot {}", file.display());
                report.deleted.push(file);
            }
            Err(cause) => {
                warn!("Failed to delete {}: {}", file.display(), cause);
                report.failures.push(BackupError::PruneFile { path: file, cause });
            }
        }
    }

    info!(
        "{}Prune finished: {} deleted, {} kept, {} failed",
        prefix,
        report.deleted.len(),
        report.retained.len(),
        report.failures.len()
    );
    Ok(report)
}
