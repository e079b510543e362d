use crate::models::config_validator::validate_config;
use crate::models::error::{BackupError, Result};
use crate::models::snapshot_name::SnapshotPattern;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_file: String,
    pub backup_directory: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default)]
    pub existing_snapshot_policy: ExistingSnapshotPolicy,
    #[serde(default = "bool_true")]
    pub verify_snapshot: bool,
    #[serde(default = "default_pages_per_step")]
    pub pages_per_step: i32,
    #[serde(default = "default_step_pause_millis")]
    pub step_pause_millis: u64,
    #[serde(default = "default_busy_timeout_millis")]
    pub busy_timeout_millis: u64,
}

/// What to do when today's snapshot name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingSnapshotPolicy {
    /// Replace the existing file once the new snapshot is complete.
    #[default]
    Overwrite,
    /// Keep the existing file and write `<prefix>_<date>_<n>.<ext>` instead.
    KeepBoth,
}

const fn default_retention_days() -> u32 {
    14
}
fn default_file_prefix() -> String {
    String::from("backup")
}
fn default_file_extension() -> String {
    String::from("db")
}
const fn bool_true() -> bool {
    true
}
const fn default_pages_per_step() -> i32 {
    100
}
const fn default_step_pause_millis() -> u64 {
    10
}
const fn default_busy_timeout_millis() -> u64 {
    5000
}

impl Config {
    pub fn source_path(&self) -> PathBuf {
        PathBuf::from(&self.database_file)
    }

    pub fn backup_path(&self) -> PathBuf {
        PathBuf::from(&self.backup_directory)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * SECONDS_PER_DAY)
    }

    pub fn snapshot_pattern(&self) -> SnapshotPattern {
        SnapshotPattern::new(&self.file_prefix, &self.file_extension)
    }

    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_millis)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_millis)
    }
}

pub fn setup_config(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        BackupError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    let config: Config = serde_json::from_str(&config_str).map_err(|cause| {
        BackupError::ConfigParse {
            path: config_path,
            cause,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}
