//! Configuration for opening a flowdex instance.

use std::path::PathBuf;

/// Configuration for opening a durable flowdex instance.
#[derive(Debug, Clone)]
pub struct FlowdexConfig {
    /// Path to the data directory.
    pub data_dir: PathBuf,
    /// Whether to fsync the journal on every commit.
    ///
    /// On by default. Turning it off trades crash durability of the most
    /// recent commits for throughput; recovery still truncates any torn
    /// tail, and an at-least-once upstream can redeliver the lost events.
    pub fsync: bool,
}

impl FlowdexConfig {
    /// Creates a new configuration with the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            fsync: true,
        }
    }

    /// Sets the fsync policy.
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }
}
