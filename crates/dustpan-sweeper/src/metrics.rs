//! Metrics collection across sweep runs

use dustpan_domain::SweepRun;
use std::time::Duration;

/// Cumulative metrics over every run a scheduler has executed
///
/// Per-run counters live in [`SweepRun`]; this type only adds them up.
#[derive(Debug, Clone, Default)]
pub struct SweepMetrics {
    /// Total sweep runs completed
    pub sweep_count: usize,

    /// Files removed across all runs
    pub files_deleted: usize,

    /// Directories removed across all runs
    pub dirs_deleted: usize,

    /// Errors across all runs
    pub errors: usize,

    /// Entries kept across all runs
    pub skipped: usize,

    /// Dry-run candidates across all runs
    pub dry_run_candidates: usize,

    /// Throttle pauses across all runs
    pub throttle_pauses: usize,

    /// Runs that stopped early on cancellation
    pub cancelled_runs: usize,

    /// Total runtime across all runs
    pub total_runtime: Duration,

    /// The most recent run
    pub last_run: Option<SweepRun>,
}

impl SweepMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished run
    pub fn record_run(&mut self, run: &SweepRun) {
        self.sweep_count += 1;
        self.files_deleted += run.files_deleted;
        self.dirs_deleted += run.dirs_deleted;
        self.errors += run.errors;
        self.skipped += run.skipped;
        self.dry_run_candidates += run.dry_run_candidates;
        self.throttle_pauses += run.throttle_pauses;
        if run.cancelled {
            self.cancelled_runs += 1;
        }
        self.total_runtime += run.elapsed();
        self.last_run = Some(run.clone());
    }

    /// Files and directories removed across all runs
    pub fn total_deleted(&self) -> usize {
        self.files_deleted + self.dirs_deleted
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Sweep Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Sweep runs: {}", self.sweep_count),
            format!("Total runtime: {:.1}s", self.total_runtime.as_secs_f64()),
            String::new(),
            format!("Files deleted: {}", self.files_deleted),
            format!("Directories deleted: {}", self.dirs_deleted),
            format!("Errors: {}", self.errors),
            format!("Skipped: {}", self.skipped),
        ];

        if self.dry_run_candidates > 0 {
            lines.push(format!("Dry-run candidates: {}", self.dry_run_candidates));
        }
        if self.throttle_pauses > 0 {
            lines.push(format!("Throttle pauses: {}", self.throttle_pauses));
        }
        if self.cancelled_runs > 0 {
            lines.push(format!("Cancelled runs: {}", self.cancelled_runs));
        }

        lines.join("\n")
    }
}
