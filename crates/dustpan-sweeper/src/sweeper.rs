//! Core sweep over all monitored roots

use crate::executor::DeletionExecutor;
use crate::walker::{TreeWalker, WalkIssue};
use dustpan_domain::traits::Pacer;
use dustpan_domain::{RuleEvaluator, RulePolicy, SweepRun};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One full evaluation pass over every monitored root
///
/// Each root is handled in turn: first its file pass (when the file rule is
/// on), then its post-order directory pass (when a directory rule is on).
/// A missing root is logged, counted as an error, and skipped.
///
/// # Examples
///
/// ```no_run
/// use dustpan_domain::RulePolicy;
/// use dustpan_sweeper::{SleepPacer, Sweeper};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// let policy = RulePolicy::builder()
///     .root("/mnt/cloud/movies")
///     .file_deletion(true)
///     .empty_dir_deletion(true)
///     .size_threshold_mb(10)
///     .build()
///     .unwrap();
///
/// let cancel = CancellationToken::new();
/// let run = Sweeper::new(Arc::new(policy)).sweep(SleepPacer::new(cancel.clone()), &cancel);
/// println!("{}", run);
/// ```
#[derive(Debug, Clone)]
pub struct Sweeper {
    policy: Arc<RulePolicy>,
    dry_run: bool,
}

impl Sweeper {
    /// Create a sweeper for a policy
    pub fn new(policy: Arc<RulePolicy>) -> Self {
        Self {
            policy,
            dry_run: false,
        }
    }

    /// Log decisions instead of deleting
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The policy this sweeper runs against
    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    /// Perform a complete sweep
    ///
    /// Blocks the calling thread, including during throttle pauses. Checks
    /// `cancel` between entries; a cancelled run returns what it did so far.
    pub fn sweep<P: Pacer>(&self, pacer: P, cancel: &CancellationToken) -> SweepRun {
        let mut executor = DeletionExecutor::new(self.policy.throttle(), self.dry_run, pacer);

        tracing::info!(
            "Sweep {} started over {} root(s){}",
            executor.run().id,
            self.policy.monitored_roots().len(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        for root in self.policy.monitored_roots() {
            if cancel.is_cancelled() {
                break;
            }

            match TreeWalker::open(root) {
                Ok(walker) => self.sweep_root(&walker, &mut executor, cancel),
                Err(e) => {
                    tracing::warn!("{}, skipping", e);
                    let run = executor.run_mut();
                    run.roots_missing += 1;
                    run.errors += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::warn!("Sweep {} cancelled", executor.run().id);
            executor.run_mut().cancelled = true;
        }

        let run = executor.into_run();
        tracing::info!("Sweep completed in {:.1}s: {}", run.elapsed().as_secs_f64(), run);
        run
    }

    fn sweep_root<P: Pacer>(
        &self,
        walker: &TreeWalker,
        executor: &mut DeletionExecutor<P>,
        cancel: &CancellationToken,
    ) {
        let evaluator = RuleEvaluator::new(&self.policy);
        let file_pass = self.policy.file_deletion();

        if file_pass {
            tracing::debug!("File pass over {}", walker.root().display());
            for item in walker.files() {
                if cancel.is_cancelled() {
                    return;
                }
                match item {
                    Ok(entry) => {
                        let decision = evaluator.evaluate(&entry);
                        executor.apply(&entry, &decision);
                    }
                    Err(issue) => record_issue(issue, executor.run_mut(), true),
                }
            }
        }

        if self.policy.dir_deletion() {
            tracing::debug!("Directory pass over {}", walker.root().display());
            for item in walker.directories() {
                if cancel.is_cancelled() {
                    return;
                }
                match item {
                    Ok(entry) => {
                        let decision = evaluator.evaluate(&entry);
                        executor.apply(&entry, &decision);
                    }
                    // Already counted by the file pass, if it ran
                    Err(issue) => record_issue(issue, executor.run_mut(), !file_pass),
                }
            }
        }
    }
}

fn record_issue(issue: WalkIssue, run: &mut SweepRun, count: bool) {
    if !count {
        tracing::debug!("{}", issue);
        return;
    }
    match issue {
        WalkIssue::Symlink(_) => tracing::warn!("{}", issue),
        WalkIssue::Io { .. } => tracing::error!("{}", issue),
    }
    run.errors += 1;
}
