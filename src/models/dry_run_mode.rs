/// Defines the dry-run behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    /// Normal operation - create the directory, write the snapshot, delete old snapshots
    None,

    /// Preview - resolve names and prune candidates, touch nothing on disk
    Preview,
}

impl DryRunMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, DryRunMode::Preview)
    }

    pub fn should_create_directory(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    pub fn should_write_snapshot(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    pub fn should_delete_files(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Prefix for log lines and the spinner
    pub fn log_prefix(&self) -> &'static str {
        match self {
            DryRunMode::None => "",
            DryRunMode::Preview => "[DRY RUN] ",
        }
    }
}
