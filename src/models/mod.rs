pub mod config;
pub mod config_validator;
pub mod dry_run_mode;
pub mod error;
pub mod run_report;
pub mod snapshot_name;
