use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which part of a run an error belongs to. Only `PruneFile` lets a run carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    DirectoryCreation,
    Snapshot,
    PruneFile,
    PruneScan,
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create backup directory '{path}': {cause}")]
    DirectoryCreation { path: PathBuf, cause: io::Error },

    #[error("Source database does not exist: '{path}'")]
    SourceMissing { path: PathBuf },

    #[error("Database backup from '{source_path}' to '{destination}' failed: {cause}")]
    SnapshotDatabase {
        source_path: PathBuf,
        destination: PathBuf,
        cause: rusqlite::Error,
    },

    #[error("Snapshot '{path}' failed integrity check: {detail}")]
    SnapshotVerification { path: PathBuf, detail: String },

    #[error("Failed to move snapshot from '{from}' to '{to}': {cause}")]
    SnapshotIo {
        from: PathBuf,
        to: PathBuf,
        cause: io::Error,
    },

    #[error("Failed to list backup directory '{path}': {cause}")]
    PruneScan { path: PathBuf, cause: String },

    #[error("Failed to delete old snapshot '{path}': {cause}")]
    PruneFile { path: PathBuf, cause: io::Error },
}

impl BackupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BackupError::ConfigRead { .. }
            | BackupError::ConfigParse { .. }
            | BackupError::InvalidConfig(_) => ErrorCategory::Configuration,
            BackupError::DirectoryCreation { .. } => ErrorCategory::DirectoryCreation,
            BackupError::SourceMissing { .. }
            | BackupError::SnapshotDatabase { .. }
            | BackupError::SnapshotVerification { .. }
            | BackupError::SnapshotIo { .. } => ErrorCategory::Snapshot,
            BackupError::PruneScan { .. } => ErrorCategory::PruneScan,
            BackupError::PruneFile { .. } => ErrorCategory::PruneFile,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_map_to_categories() {
        let prune_file = BackupError::PruneFile {
            path: PathBuf::from("backup_2024-01-01.db"),
            cause: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(prune_file.category(), ErrorCategory::PruneFile);

        let missing = BackupError::SourceMissing {
            path: PathBuf::from("friends.db"),
        };
        assert_eq!(missing.category(), ErrorCategory::Snapshot);

        let invalid = BackupError::InvalidConfig("retention_days must be at least 1".into());
        assert_eq!(invalid.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = BackupError::DirectoryCreation {
            path: PathBuf::from("/root/backups"),
            cause: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/root/backups"));
    }
}
