use crate::models::config::Config;
use crate::models::error::{BackupError, Result};
use log::{info, warn};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_numeric_values(config)?;

    validate_database_path(&config.database_file)?;

    validate_backup_directory(&config.backup_directory)?;

    validate_snapshot_naming(&config.file_prefix, &config.file_extension)?;

    check_distinct_paths(config)?;

    info!("Configuration validation passed");
    Ok(())
}

fn validate_numeric_values(config: &Config) -> Result<()> {
    if config.retention_days == 0 {
        return Err(BackupError::InvalidConfig(
            "retention_days must be at least 1".to_string(),
        ));
    }

    // sqlite3_backup_step treats any negative count as "copy everything"
    if config.pages_per_step == 0 || config.pages_per_step < -1 {
        return Err(BackupError::InvalidConfig(format!(
            "pages_per_step must be a positive number of pages or -1 for all pages, got {}",
            config.pages_per_step
        )));
    }

    if config.busy_timeout_millis == 0 {
        warn!("busy_timeout_millis is 0: the snapshot fails immediately if the source is locked");
    }

    Ok(())
}

/// The source only has to be plausible here. A missing file is a snapshot failure, not a config one.
fn validate_database_path(db_file: &str) -> Result<()> {
    if db_file.trim().is_empty() {
        return Err(BackupError::InvalidConfig(
            "database_file must be set to the path of the database to back up".to_string(),
        ));
    }

    if Path::new(db_file).is_dir() {
        return Err(BackupError::InvalidConfig(format!(
            "database_file points at a directory: {}",
            db_file
        )));
    }

    Ok(())
}

fn validate_backup_directory(dir: &str) -> Result<()> {
    if dir.trim().is_empty() {
        return Err(BackupError::InvalidConfig(
            "backup_directory must be set".to_string(),
        ));
    }

    let path = Path::new(dir);
    if path.exists() && !path.is_dir() {
        return Err(BackupError::InvalidConfig(format!(
            "backup_directory exists but is not a directory: {}",
            dir
        )));
    }

    if !path.exists() {
        info!("Backup directory does not exist yet and will be created: {}", dir);
    }

    Ok(())
}

fn validate_snapshot_naming(prefix: &str, extension: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(BackupError::InvalidConfig(
            "file_prefix must not be empty, or unrelated files could be pruned".to_string(),
        ));
    }
    if prefix.contains(['/', '\\']) || prefix.starts_with('.') {
        return Err(BackupError::InvalidConfig(format!(
            "file_prefix must be a plain file name component: {}",
            prefix
        )));
    }

    if extension.is_empty() {
        return Err(BackupError::InvalidConfig(
            "file_extension must not be empty".to_string(),
        ));
    }
    if extension.contains(['/', '\\', '.']) {
        return Err(BackupError::InvalidConfig(format!(
            "file_extension must not contain separators or dots: {}",
            extension
        )));
    }

    Ok(())
}

fn check_distinct_paths(config: &Config) -> Result<()> {
    let source = normalize_path(&config.source_path());
    let backup_dir = normalize_path(&config.backup_path());
    if source.parent() == Some(backup_dir.as_path())
        && config.snapshot_pattern().matches(&source).is_some()
    {
        return Err(BackupError::InvalidConfig(format!(
            "database_file {} matches the snapshot naming pattern inside backup_directory and would be pruned",
            config.database_file
        )));
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` folded away. The longest existing ancestor
/// is canonicalized so symlinked and literal spellings of a directory compare equal.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    for ancestor in lexical.ancestors() {
        if let Ok(real) = fs::canonicalize(ancestor) {
            if let Ok(rest) = lexical.strip_prefix(ancestor) {
                return real.join(rest);
            }
        }
    }
    lexical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExistingSnapshotPolicy;
    use tempfile::TempDir;

    fn create_test_config(dir: &Path) -> Config {
        Config {
            database_file: dir.join("friends.db").to_str().unwrap().to_string(),
            backup_directory: dir.join("backups").to_str().unwrap().to_string(),
            retention_days: 14,
            file_prefix: "friends".to_string(),
            file_extension: "db".to_string(),
            existing_snapshot_policy: ExistingSnapshotPolicy::Overwrite,
            verify_snapshot: true,
            pages_per_step: 100,
            step_pause_millis: 10,
            busy_timeout_millis: 5000,
        }
    }

    #[test]
    fn test_validate_config_passes_for_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(temp_dir.path());

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_retention() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.retention_days = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("retention_days"));
    }

    #[test]
    fn test_pages_per_step_accepts_minus_one_only_as_negative() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());

        config.pages_per_step = -1;
        assert!(validate_numeric_values(&config).is_ok());

        config.pages_per_step = 0;
        assert!(validate_numeric_values(&config).is_err());

        config.pages_per_step = -5;
        assert!(validate_numeric_values(&config).is_err());
    }

    #[test]
    fn test_rejects_unset_paths() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = create_test_config(temp_dir.path());
        config.database_file = String::new();
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("database_file"));

        let mut config = create_test_config(temp_dir.path());
        config.backup_directory = "   ".to_string();
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("backup_directory"));
    }

    #[test]
    fn test_missing_source_is_not_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.database_file = temp_dir
            .path()
            .join("not_created_yet.db")
            .to_str()
            .unwrap()
            .to_string();

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_source_that_is_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.database_file = temp_dir.path().to_str().unwrap().to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("directory"));
    }

    #[test]
    fn test_rejects_backup_directory_that_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("backups");
        std::fs::write(&file, b"not a directory").unwrap();

        let config = create_test_config(temp_dir.path());
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_rejects_bad_naming() {
        assert!(validate_snapshot_naming("", "db").is_err());
        assert!(validate_snapshot_naming("nested/friends", "db").is_err());
        assert!(validate_snapshot_naming(".hidden", "db").is_err());
        assert!(validate_snapshot_naming("friends", "").is_err());
        assert!(validate_snapshot_naming("friends", "tar.gz").is_err());
        assert!(validate_snapshot_naming("friends", "sqlite3").is_ok());
    }

    #[test]
    fn test_rejects_source_that_looks_like_a_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.database_file = temp_dir
            .path()
            .join("backups")
            .join("friends_2024-03-01.db")
            .to_str()
            .unwrap()
            .to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("would be pruned"));
    }

    #[test]
    fn test_rejects_snapshot_named_source_spelled_differently() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap().to_string();

        let spellings = [
            format!("{}/./backups/friends_2024-03-01.db", root),
            format!("{}/other/../backups/friends_2024-03-01.db", root),
        ];
        for spelling in spellings {
            let mut config = create_test_config(temp_dir.path());
            config.database_file = spelling.clone();

            let result = validate_config(&config);
            assert!(
                result.is_err(),
                "{} should be caught as living in the backup directory",
                spelling
            );
        }

        // same check once the directory exists and gets canonicalized
        fs::create_dir(temp_dir.path().join("backups")).unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.backup_directory = format!("{}/backups/.", root);
        config.database_file = format!("{}/backups/friends_2024-03-01.db", root);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_normalize_path_folds_dot_components() {
        let temp_dir = TempDir::new().unwrap();
        let plain = normalize_path(&temp_dir.path().join("backups"));

        assert_eq!(normalize_path(&temp_dir.path().join(".").join("backups")), plain);
        assert_eq!(
            normalize_path(&temp_dir.path().join("x").join("..").join("backups")),
            plain
        );
        assert!(plain.is_absolute());
    }
}
