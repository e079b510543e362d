pub mod backup;
pub mod prune;
pub mod snapshot;
