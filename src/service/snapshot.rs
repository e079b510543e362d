use crate::models::error::Result;
use std::path::Path;

/// Something that can write a transactionally consistent copy of `source` to `destination`.
///
/// `destination` is always a fresh path chosen by the caller; moving the finished copy onto
/// the dated snapshot name is the caller's job.
pub trait SnapshotEngine {
    fn snapshot(&self, source: &Path, destination: &Path) -> Result<()>;
}
