//! Run module - one execution of the sweep and its counters

use std::fmt;
use std::time::{Duration, SystemTime};

/// Unique identifier for a sweep run based on UUIDv7
///
/// Runs sort chronologically by id, which keeps log lines from successive
/// sweeps easy to correlate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u128);

impl RunId {
    /// Generate a new UUIDv7-based RunId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Counters for one sweep execution
///
/// Created when a sweep starts and returned to the caller when it ends.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepRun {
    /// Run identifier
    pub id: RunId,
    /// When the sweep started
    pub started_at: SystemTime,
    /// When the sweep finished, if it has
    pub finished_at: Option<SystemTime>,
    /// Files removed
    pub files_deleted: usize,
    /// Directories removed
    pub dirs_deleted: usize,
    /// Failed operations, including missing roots, unreadable entries and symlinks
    pub errors: usize,
    /// Entries that were evaluated and kept
    pub skipped: usize,
    /// Entries that would have been removed in dry-run mode
    pub dry_run_candidates: usize,
    /// Throttle pauses taken
    pub throttle_pauses: usize,
    /// Monitored roots that did not exist
    pub roots_missing: usize,
    /// Whether the sweep stopped early on cancellation
    pub cancelled: bool,
}

impl SweepRun {
    /// Start a new run
    pub fn start() -> Self {
        Self {
            id: RunId::new(),
            started_at: SystemTime::now(),
            finished_at: None,
            files_deleted: 0,
            dirs_deleted: 0,
            errors: 0,
            skipped: 0,
            dry_run_candidates: 0,
            throttle_pauses: 0,
            roots_missing: 0,
            cancelled: false,
        }
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(SystemTime::now());
    }

    /// Total entries removed
    pub fn total_deleted(&self) -> usize {
        self.files_deleted + self.dirs_deleted
    }

    /// Wall-clock duration (up to now if unfinished)
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(SystemTime::now);
        end.duration_since(self.started_at).unwrap_or_default()
    }
}

impl fmt::Display for SweepRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} files deleted, {} directories deleted, {} errors, {} skipped",
            self.id, self.files_deleted, self.dirs_deleted, self.errors, self.skipped
        )?;
        if self.dry_run_candidates > 0 {
            write!(f, ", {} dry-run candidates", self.dry_run_candidates)?;
        }
        if self.cancelled {
            f.write_str(" (cancelled)")?;
        }
        Ok(())
    }
}
