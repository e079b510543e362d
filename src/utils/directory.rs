use crate::models::error::{BackupError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Creates `dir` and any missing parents. Succeeds if it is already there.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        debug!("Backup directory already exists: {}", dir.display());
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|cause| BackupError::DirectoryCreation {
        path: dir.to_path_buf(),
        cause,
    })
}

/// Regular files directly inside `dir`. Subdirectories and symlinks are skipped.
pub fn get_files_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BackupError::PruneScan {
            path: dir.to_path_buf(),
            cause: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}
