//! Deletion execution with per-item failure handling and throttling

use crate::SweepError;
use dustpan_domain::traits::Pacer;
use dustpan_domain::{Decision, DelayRange, FileSystemEntry, KeepReason, SweepRun, Throttle};
use rand::Rng;
use std::fs;
use std::io::ErrorKind;
use std::time::Duration;

/// Result of applying one decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Entry was removed
    Deleted,
    /// Entry was retained
    Skipped(KeepReason),
    /// Entry would have been removed, but dry-run mode is on
    DryRun,
    /// Removal was attempted and failed
    Failed(String),
}

/// Applies decisions to the filesystem and counts what happened
///
/// Files are removed with a single non-recursive unlink and directories with
/// an `rmdir`-style removal, so a directory that gained children since it was
/// evaluated fails instead of taking its contents with it.
///
/// # Examples
///
/// ```no_run
/// use dustpan_domain::{Decision, DeleteReason, FileSystemEntry, Throttle};
/// use dustpan_sweeper::{DeletionExecutor, SleepPacer};
///
/// let mut executor = DeletionExecutor::new(Throttle::parse_lenient("10,1-3"), false, SleepPacer::default());
/// let entry = FileSystemEntry::file("/mnt/cloud/a.nfo", 120);
/// executor.apply(&entry, &Decision::Delete(DeleteReason::FileWithinThreshold));
/// println!("{}", executor.run());
/// ```
pub struct DeletionExecutor<P: Pacer> {
    throttle: Throttle,
    dry_run: bool,
    pacer: P,
    since_pause: u32,
    run: SweepRun,
}

impl<P: Pacer> DeletionExecutor<P> {
    /// Create an executor for one sweep run
    pub fn new(throttle: Throttle, dry_run: bool, pacer: P) -> Self {
        Self {
            throttle,
            dry_run,
            pacer,
            since_pause: 0,
            run: SweepRun::start(),
        }
    }

    /// Counters so far
    pub fn run(&self) -> &SweepRun {
        &self.run
    }

    /// Mutable counters, for issues found outside of `apply`
    pub fn run_mut(&mut self) -> &mut SweepRun {
        &mut self.run
    }

    /// Finish the run and hand back its counters
    pub fn into_run(mut self) -> SweepRun {
        self.run.finish();
        self.run
    }

    /// Apply a decision to an entry
    pub fn apply(&mut self, entry: &FileSystemEntry, decision: &Decision) -> Outcome {
        let reason = match decision {
            Decision::Keep(reason) => {
                tracing::debug!("Keeping {}: {}", entry.path().display(), reason);
                self.run.skipped += 1;
                return Outcome::Skipped(reason.clone());
            }
            Decision::Delete(reason) => *reason,
        };

        if self.dry_run {
            tracing::info!("DRY RUN: Would delete {} ({})", entry.path().display(), reason);
            self.run.dry_run_candidates += 1;
            return Outcome::DryRun;
        }

        let result = if entry.is_file() {
            fs::remove_file(entry.path())
        } else {
            fs::remove_dir(entry.path())
        };

        match result {
            Ok(()) => {
                tracing::info!("Deleted {} ({})", entry.path().display(), reason);
                if entry.is_file() {
                    self.run.files_deleted += 1;
                    self.after_file_deletion();
                } else {
                    self.run.dirs_deleted += 1;
                }
                Outcome::Deleted
            }
            Err(source) => {
                let err = if source.kind() == ErrorKind::DirectoryNotEmpty {
                    SweepError::Race(entry.path().to_path_buf())
                } else {
                    SweepError::Item {
                        path: entry.path().to_path_buf(),
                        source,
                    }
                };
                tracing::error!("{}", err);
                self.run.errors += 1;
                Outcome::Failed(err.to_string())
            }
        }
    }

    fn after_file_deletion(&mut self) {
        if !self.throttle.is_enabled() {
            return;
        }

        self.since_pause += 1;
        if self.since_pause >= self.throttle.batch_size() {
            let delay = draw_delay(self.throttle.delay());
            tracing::info!(
                "Deleted {} files, pausing for {:.1}s",
                self.since_pause,
                delay.as_secs_f64()
            );
            self.pacer.pause(delay);
            self.run.throttle_pauses += 1;
            self.since_pause = 0;
        }
    }
}

/// Uniformly random delay within the range, at millisecond granularity
fn draw_delay(range: DelayRange) -> Duration {
    if range.min() == range.max() {
        return range.min();
    }
    let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    let (min, max) = (millis(range.min()), millis(range.max()));
    Duration::from_millis(rand::rng().random_range(min..=max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dustpan_domain::DeleteReason;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingPacer {
        pauses: Vec<Duration>,
    }

    impl Pacer for &mut RecordingPacer {
        fn pause(&mut self, duration: Duration) {
            self.pauses.push(duration);
        }
    }

    const DELETE_FILE: Decision = Decision::Delete(DeleteReason::FileWithinThreshold);
    const DELETE_EMPTY: Decision = Decision::Delete(DeleteReason::EmptyDirectory);

    fn file(dir: &Path, name: &str) -> FileSystemEntry {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        FileSystemEntry::file(path, 1)
    }

    #[test]
    fn test_deletes_file() {
        let dir = TempDir::new().unwrap();
        let entry = file(dir.path(), "a.txt");
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::NONE, false, &mut pacer);

        assert_eq!(executor.apply(&entry, &DELETE_FILE), Outcome::Deleted);
        assert!(!entry.path().exists());

        let run = executor.into_run();
        assert_eq!(run.files_deleted, 1);
        assert_eq!(run.errors, 0);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_keep_is_skipped() {
        let dir = TempDir::new().unwrap();
        let entry = file(dir.path(), "a.txt");
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::NONE, false, &mut pacer);

        let outcome = executor.apply(&entry, &Decision::Keep(KeepReason::AboveThreshold));
        assert_eq!(outcome, Outcome::Skipped(KeepReason::AboveThreshold));
        assert!(entry.path().exists());
        assert_eq!(executor.run().skipped, 1);
    }

    #[test]
    fn test_missing_file_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let entry = FileSystemEntry::file(dir.path().join("gone.txt"), 1);
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::NONE, false, &mut pacer);

        assert!(matches!(executor.apply(&entry, &DELETE_FILE), Outcome::Failed(_)));
        assert_eq!(executor.run().errors, 1);
        assert_eq!(executor.run().files_deleted, 0);
    }

    #[test]
    fn test_non_empty_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("late.txt"), b"x").unwrap();
        let entry = FileSystemEntry::directory(&sub, 0, 0);

        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::NONE, false, &mut pacer);

        match executor.apply(&entry, &DELETE_EMPTY) {
            Outcome::Failed(reason) => assert!(reason.contains("not empty")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(sub.join("late.txt").exists());
        assert_eq!(executor.run().errors, 1);
    }

    #[test]
    fn test_deletes_empty_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let entry = FileSystemEntry::directory(&sub, 0, 0);

        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::NONE, false, &mut pacer);

        assert_eq!(executor.apply(&entry, &DELETE_EMPTY), Outcome::Deleted);
        assert!(!sub.exists());
        assert_eq!(executor.run().dirs_deleted, 1);
    }

    #[test]
    fn test_dry_run_keeps_everything() {
        let dir = TempDir::new().unwrap();
        let entry = file(dir.path(), "a.txt");
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::parse_lenient("1,1-1"), true, &mut pacer);

        assert_eq!(executor.apply(&entry, &DELETE_FILE), Outcome::DryRun);
        assert!(entry.path().exists());
        let run = executor.into_run();
        assert_eq!(run.dry_run_candidates, 1);
        assert_eq!(run.files_deleted, 0);
        assert!(pacer.pauses.is_empty());
    }

    #[test]
    fn test_throttle_pauses_after_each_batch() {
        let dir = TempDir::new().unwrap();
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::parse("2,1-1").unwrap(), false, &mut pacer);

        for i in 0..5 {
            let entry = file(dir.path(), &format!("{}.txt", i));
            assert_eq!(executor.apply(&entry, &DELETE_FILE), Outcome::Deleted);
        }

        let run = executor.into_run();
        assert_eq!(run.files_deleted, 5);
        assert_eq!(run.throttle_pauses, 2);
        assert_eq!(pacer.pauses, vec![Duration::from_secs(1), Duration::from_secs(1)]);
    }

    #[test]
    fn test_throttle_ignores_failures_and_directories() {
        let dir = TempDir::new().unwrap();
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::parse("2,1-1").unwrap(), false, &mut pacer);

        let a = file(dir.path(), "a.txt");
        executor.apply(&a, &DELETE_FILE);
        executor.apply(&FileSystemEntry::file(dir.path().join("missing"), 1), &DELETE_FILE);
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        executor.apply(&FileSystemEntry::directory(&sub, 0, 0), &DELETE_EMPTY);

        assert_eq!(executor.run().throttle_pauses, 0);
        drop(executor);
        assert!(pacer.pauses.is_empty());
    }

    #[test]
    fn test_random_delay_within_range() {
        let dir = TempDir::new().unwrap();
        let mut pacer = RecordingPacer::default();
        let mut executor = DeletionExecutor::new(Throttle::parse("1,1-3").unwrap(), false, &mut pacer);

        for i in 0..20 {
            let entry = file(dir.path(), &format!("{}.txt", i));
            executor.apply(&entry, &DELETE_FILE);
        }
        drop(executor);

        assert_eq!(pacer.pauses.len(), 20);
        for pause in pacer.pauses {
            assert!(pause >= Duration::from_secs(1) && pause <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_widest_delay_range_draws_in_bounds() {
        let range = DelayRange::new(Duration::ZERO, dustpan_domain::MAX_DELAY).unwrap();
        for _ in 0..50 {
            assert!(draw_delay(range) <= dustpan_domain::MAX_DELAY);
        }
        let fixed = DelayRange::new(dustpan_domain::MAX_DELAY, dustpan_domain::MAX_DELAY).unwrap();
        assert_eq!(draw_delay(fixed), dustpan_domain::MAX_DELAY);
    }
}
