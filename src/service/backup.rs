use crate::models::config::{Config, ExistingSnapshotPolicy};
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::models::run_report::{PruneReport, RunReport};
use crate::models::snapshot_name::SnapshotPattern;
use crate::service::prune::prune_snapshots;
use crate::service::snapshot::SnapshotEngine;
use crate::utils::directory::ensure_directory;
use crate::utils::progress::format_bytes;
use chrono::{DateTime, Local, NaiveDate};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ensures the backup directory, writes today's snapshot, then prunes expired ones.
pub struct BackupRunner<E: SnapshotEngine> {
    config: Config,
    engine: E,
    dry_run_mode: DryRunMode,
}

impl<E: SnapshotEngine> BackupRunner<E> {
    pub fn new(config: Config, engine: E, dry_run_mode: DryRunMode) -> Self {
        BackupRunner {
            config,
            engine,
            dry_run_mode,
        }
    }

    pub fn run(&self) -> Result<RunReport> {
        self.run_at(Local::now())
    }

    /// Same as [`run`](Self::run) with an explicit clock reading. The date names the
    /// snapshot and the instant anchors the retention cutoff.
    pub fn run_at(&self, now: DateTime<Local>) -> Result<RunReport> {
        let prefix = self.dry_run_mode.log_prefix();
        let source = self.config.source_path();
        let backup_dir = self.config.backup_path();
        let pattern = self.config.snapshot_pattern();

        if self.dry_run_mode.should_create_directory() {
            ensure_directory(&backup_dir)?;
        } else if !backup_dir.is_dir() {
            info!("{}Would create backup directory {}", prefix, backup_dir.display());
        }

        let target = self.resolve_target(&backup_dir, &pattern, now.date_naive());

        let snapshot_bytes = if self.dry_run_mode.should_write_snapshot() {
            info!(
                "Snapshotting {} to {}",
                source.display(),
                target.display()
            );
            let bytes = self.write_snapshot(&source, &target)?;
            info!(
                "Snapshot written to {} ({})",
                target.display(),
                format_bytes(bytes)
            );
            Some(bytes)
        } else {
            if !source.is_file() {
                return Err(BackupError::SourceMissing { path: source });
            }
            info!(
                "{}Would snapshot {} to {}",
                prefix,
                source.display(),
                target.display()
            );
            None
        };

        let prune = prune_snapshots(
            &backup_dir,
            &pattern,
            self.config.retention(),
            now.into(),
            self.dry_run_mode,
        )?;
        log_prune_failures(&prune);

        Ok(RunReport {
            snapshot_path: target,
            snapshot_bytes,
            prune,
        })
    }

    fn resolve_target(&self, dir: &Path, pattern: &SnapshotPattern, date: NaiveDate) -> PathBuf {
        let base = dir.join(pattern.file_name(date));
        match self.config.existing_snapshot_policy {
            ExistingSnapshotPolicy::Overwrite => {
                if base.exists() {
                    info!("Today's snapshot already exists and will be replaced: {}", base.display());
                }
                base
            }
            ExistingSnapshotPolicy::KeepBoth => {
                if !base.exists() {
                    return base;
                }
                let next = (1u32..)
                    .map(|sequence| dir.join(pattern.file_name_with_sequence(date, sequence)))
                    .find(|candidate| !candidate.exists())
                    .unwrap_or(base);
                debug!("Today's snapshot already exists, writing {}", next.display());
                next
            }
        }
    }

    /// Writes into a hidden sibling first so a failed run never leaves a half-written
    /// file under a name the pruner recognises.
    fn write_snapshot(&self, source: &Path, target: &Path) -> Result<u64> {
        let partial = partial_path(target);
        discard_partial(&partial);

        if let Err(e) = self.engine.snapshot(source, &partial) {
            discard_partial(&partial);
            return Err(e);
        }

        if let Err(cause) = fs::rename(&partial, target) {
            discard_partial(&partial);
            return Err(BackupError::SnapshotIo {
                from: partial,
                to: target.to_path_buf(),
                cause,
            });
        }

        let metadata = fs::metadata(target).map_err(|cause| BackupError::SnapshotIo {
            from: partial.clone(),
            to: target.to_path_buf(),
            cause,
        })?;
        Ok(metadata.len())
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.partial", name))
}

/// Removes the temp file and any journal SQLite left beside it.
fn discard_partial(partial: &Path) {
    let mut leftovers = vec![partial.to_path_buf()];
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut name = partial.as_os_str().to_owned();
        name.push(suffix);
        leftovers.push(PathBuf::from(name));
    }

    for path in leftovers {
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed leftover {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove leftover {}: {}", path.display(), e),
        }
    }
}

fn log_prune_failures(report: &PruneReport) {
    if !report.has_failures() {
        return;
    }
    warn!(
        "{} expired snapshot(s) could not be deleted and will be retried next run",
        report.failures.len()
    );
    for failure in &report.failures {
        warn!("  {}", failure);
    }
}
