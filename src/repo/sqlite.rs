use crate::models::config::Config;
use crate::models::error::{BackupError, Result};
use crate::service::snapshot::SnapshotEngine;
use log::{debug, info};
use rusqlite::backup::{Backup, StepResult};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Snapshots through SQLite's online backup API, so the copy is consistent even while
/// another process holds the source open for writing.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotEngine {
    pages_per_step: i32,
    step_pause: Duration,
    busy_timeout: Duration,
    verify: bool,
}

impl SqliteSnapshotEngine {
    pub fn from_config(config: &Config) -> Self {
        SqliteSnapshotEngine {
            pages_per_step: config.pages_per_step,
            step_pause: config.step_pause(),
            busy_timeout: config.busy_timeout(),
            verify: config.verify_snapshot,
        }
    }
}

impl SnapshotEngine for SqliteSnapshotEngine {
    fn snapshot(&self, source: &Path, destination: &Path) -> Result<()> {
        if !source.is_file() {
            return Err(BackupError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        let db_error = |cause: rusqlite::Error| BackupError::SnapshotDatabase {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            cause,
        };

        let src = open_source(source, self.busy_timeout).map_err(db_error)?;
        let mut dst = Connection::open(destination).map_err(db_error)?;

        {
            let backup = Backup::new(&src, &mut dst).map_err(db_error)?;
            if self.pages_per_step > 0 {
                backup
                    .run_to_completion(self.pages_per_step, self.step_pause, None)
                    .map_err(db_error)?;
            } else {
                copy_all_pages(&backup, self.step_pause).map_err(db_error)?;
            }
        }
        debug!(
            "Copied {} into {}",
            source.display(),
            destination.display()
        );

        // pages carry the source's WAL flag; a snapshot should be one self-contained file
        dst.pragma_update_and_check(None, "journal_mode", "DELETE", |row| {
            row.get::<_, String>(0)
        })
        .map_err(db_error)?;

        if self.verify {
            verify_snapshot(&dst, destination)?;
        }

        dst.close().map_err(|(_, cause)| db_error(cause))?;
        Ok(())
    }
}

/// `run_to_completion` only takes a positive page count; a negative step copies
/// everything in one go and only has to be retried while the source is busy.
fn copy_all_pages(backup: &Backup<'_, '_>, pause: Duration) -> rusqlite::Result<()> {
    loop {
        match backup.step(-1)? {
            StepResult::Done => return Ok(()),
            _ => thread::sleep(pause),
        }
    }
}

/// Read-only, never creates the file.
fn open_source(source: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        source,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

fn verify_snapshot(conn: &Connection, path: &Path) -> Result<()> {
    let result: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(|cause| BackupError::SnapshotVerification {
            path: path.to_path_buf(),
            detail: cause.to_string(),
        })?;

    if result != "ok" {
        return Err(BackupError::SnapshotVerification {
            path: path.to_path_buf(),
            detail: result,
        });
    }
    info!("Snapshot passed quick_check: {}", path.display());
    Ok(())
}
