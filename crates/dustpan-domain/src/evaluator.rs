//! Rule evaluation - pure keep/delete decisions
//!
//! The evaluator never touches the filesystem. Everything it needs about an
//! entry was captured by the walker in [`FileSystemEntry`].
//!
//! Directory rules are checked in a fixed order: the small-directory rule
//! first (when enabled), then the empty-directory rule. A directory that
//! satisfies both is reported once, under the small-directory reason.

use crate::entry::{EntryKind, FileSystemEntry};
use crate::policy::RulePolicy;
use std::fmt;

/// Outcome of evaluating one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Entry qualifies for removal
    Delete(DeleteReason),
    /// Entry is retained
    Keep(KeepReason),
}

impl Decision {
    /// Whether this decision removes the entry
    pub fn is_delete(&self) -> bool {
        matches!(self, Decision::Delete(_))
    }
}

/// Why an entry qualifies for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteReason {
    /// File at or below the size threshold
    FileWithinThreshold,
    /// Directory whose direct child files total less than the threshold
    SmallDirectory,
    /// Directory with no children
    EmptyDirectory,
}

impl DeleteReason {
    /// Short label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteReason::FileWithinThreshold => "file within threshold",
            DeleteReason::SmallDirectory => "small directory",
            DeleteReason::EmptyDirectory => "empty directory",
        }
    }
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an entry is retained
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeepReason {
    /// Path contains an exclusion keyword
    Excluded(String),
    /// No rule for this kind of entry is active
    RuleDisabled,
    /// File is larger than the threshold
    AboveThreshold,
    /// Directory still has children
    NotEmpty,
    /// Directory's direct files reach the threshold
    NotSmall,
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepReason::Excluded(keyword) => write!(f, "matches keyword '{}'", keyword),
            KeepReason::RuleDisabled => f.write_str("rule disabled"),
            KeepReason::AboveThreshold => f.write_str("above size threshold"),
            KeepReason::NotEmpty => f.write_str("not empty"),
            KeepReason::NotSmall => f.write_str("not below size threshold"),
        }
    }
}

/// Pure decision function over a [`RulePolicy`]
///
/// # Examples
///
/// ```
/// use dustpan_domain::{Decision, DeleteReason, FileSystemEntry, RuleEvaluator, RulePolicy};
///
/// let policy = RulePolicy::builder()
///     .file_deletion(true)
///     .size_threshold_mb(10)
///     .keyword("keep")
///     .build()
///     .unwrap();
/// let evaluator = RuleEvaluator::new(&policy);
///
/// let small = FileSystemEntry::file("/m/a.txt", 5 * 1024 * 1024);
/// assert_eq!(evaluator.evaluate(&small), Decision::Delete(DeleteReason::FileWithinThreshold));
///
/// let protected = FileSystemEntry::file("/m/keep/b.txt", 5 * 1024 * 1024);
/// assert!(!evaluator.evaluate(&protected).is_delete());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator<'a> {
    policy: &'a RulePolicy,
}

impl<'a> RuleEvaluator<'a> {
    /// Create an evaluator for a policy
    pub fn new(policy: &'a RulePolicy) -> Self {
        Self { policy }
    }

    /// Decide whether an entry should be removed
    pub fn evaluate(&self, entry: &FileSystemEntry) -> Decision {
        match entry.kind() {
            EntryKind::File { size } => self.evaluate_file(entry, size),
            EntryKind::Directory {
                child_count,
                direct_file_bytes,
            } => self.evaluate_directory(entry, child_count, direct_file_bytes),
        }
    }

    fn evaluate_file(&self, entry: &FileSystemEntry, size: u64) -> Decision {
        if let Some(keyword) = self.policy.matching_keyword(entry.path()) {
            return Decision::Keep(KeepReason::Excluded(keyword.to_string()));
        }
        if !self.policy.file_deletion() {
            return Decision::Keep(KeepReason::RuleDisabled);
        }
        if size > self.policy.size_threshold_bytes() {
            return Decision::Keep(KeepReason::AboveThreshold);
        }
        Decision::Delete(DeleteReason::FileWithinThreshold)
    }

    fn evaluate_directory(
        &self,
        entry: &FileSystemEntry,
        child_count: usize,
        direct_file_bytes: u64,
    ) -> Decision {
        if let Some(keyword) = self.policy.matching_keyword(entry.path()) {
            return Decision::Keep(KeepReason::Excluded(keyword.to_string()));
        }
        if !self.policy.dir_deletion() {
            return Decision::Keep(KeepReason::RuleDisabled);
        }

        if self.policy.small_dir_deletion() && direct_file_bytes < self.policy.size_threshold_bytes() {
            return Decision::Delete(DeleteReason::SmallDirectory);
        }
        if self.policy.empty_dir_deletion() {
            if child_count == 0 {
                return Decision::Delete(DeleteReason::EmptyDirectory);
            }
            return Decision::Keep(KeepReason::NotEmpty);
        }

        Decision::Keep(KeepReason::NotSmall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn policy(files: bool, empty: bool, small: bool) -> RulePolicy {
        RulePolicy::builder()
            .root("/m")
            .keyword("keep")
            .file_deletion(files)
            .empty_dir_deletion(empty)
            .small_dir_deletion(small)
            .size_threshold_mb(10)
            .build()
            .unwrap()
    }

    #[test]
    fn test_file_at_threshold_is_deleted() {
        let policy = policy(true, false, false);
        let evaluator = RuleEvaluator::new(&policy);
        let entry = FileSystemEntry::file("/m/a.bin", 10 * MB);
        assert_eq!(
            evaluator.evaluate(&entry),
            Decision::Delete(DeleteReason::FileWithinThreshold)
        );
    }

    #[test]
    fn test_file_above_threshold_is_kept() {
        let policy = policy(true, false, false);
        let evaluator = RuleEvaluator::new(&policy);
        let entry = FileSystemEntry::file("/m/a.bin", 10 * MB + 1);
        assert_eq!(evaluator.evaluate(&entry), Decision::Keep(KeepReason::AboveThreshold));
    }

    #[test]
    fn test_file_rule_disabled() {
        let policy = policy(false, true, true);
        let evaluator = RuleEvaluator::new(&policy);
        let entry = FileSystemEntry::file("/m/a.bin", 1);
        assert_eq!(evaluator.evaluate(&entry), Decision::Keep(KeepReason::RuleDisabled));
    }

    #[test]
    fn test_keyword_beats_everything() {
        let policy = policy(true, true, true);
        let evaluator = RuleEvaluator::new(&policy);

        let file = FileSystemEntry::file("/m/keep/b.txt", 0);
        assert_eq!(
            evaluator.evaluate(&file),
            Decision::Keep(KeepReason::Excluded("keep".into()))
        );

        let dir = FileSystemEntry::directory("/m/keep", 0, 0);
        assert_eq!(
            evaluator.evaluate(&dir),
            Decision::Keep(KeepReason::Excluded("keep".into()))
        );
    }

    #[test]
    fn test_empty_directory_rule() {
        let policy = policy(false, true, false);
        let evaluator = RuleEvaluator::new(&policy);

        let empty = FileSystemEntry::directory("/m/empty", 0, 0);
        assert_eq!(
            evaluator.evaluate(&empty),
            Decision::Delete(DeleteReason::EmptyDirectory)
        );

        let full = FileSystemEntry::directory("/m/full", 1, 0);
        assert_eq!(evaluator.evaluate(&full), Decision::Keep(KeepReason::NotEmpty));
    }

    #[test]
    fn test_small_directory_rule_ignores_emptiness() {
        let policy = policy(false, false, true);
        let evaluator = RuleEvaluator::new(&policy);

        let small = FileSystemEntry::directory("/m/small", 3, 2 * MB);
        assert_eq!(
            evaluator.evaluate(&small),
            Decision::Delete(DeleteReason::SmallDirectory)
        );

        let at_threshold = FileSystemEntry::directory("/m/big", 1, 10 * MB);
        assert_eq!(evaluator.evaluate(&at_threshold), Decision::Keep(KeepReason::NotSmall));
    }

    #[test]
    fn test_small_checked_before_empty() {
        let policy = policy(false, true, true);
        let evaluator = RuleEvaluator::new(&policy);

        let empty = FileSystemEntry::directory("/m/empty", 0, 0);
        assert_eq!(
            evaluator.evaluate(&empty),
            Decision::Delete(DeleteReason::SmallDirectory)
        );

        // Not small, but empty rule still applies after
        let big_but_empty_now = FileSystemEntry::directory("/m/big", 0, 20 * MB);
        assert_eq!(
            evaluator.evaluate(&big_but_empty_now),
            Decision::Delete(DeleteReason::EmptyDirectory)
        );

        let big = FileSystemEntry::directory("/m/big", 2, 20 * MB);
        assert_eq!(evaluator.evaluate(&big), Decision::Keep(KeepReason::NotEmpty));
    }

    #[test]
    fn test_zero_threshold_disables_small_rule() {
        let policy = RulePolicy::builder()
            .small_dir_deletion(true)
            .size_threshold_mb(0)
            .build()
            .unwrap();
        let evaluator = RuleEvaluator::new(&policy);
        let empty = FileSystemEntry::directory("/m/empty", 0, 0);
        assert_eq!(evaluator.evaluate(&empty), Decision::Keep(KeepReason::NotSmall));
    }

    #[test]
    fn test_directory_rules_disabled() {
        let policy = policy(true, false, false);
        let evaluator = RuleEvaluator::new(&policy);
        let empty = FileSystemEntry::directory("/m/empty", 0, 0);
        assert_eq!(evaluator.evaluate(&empty), Decision::Keep(KeepReason::RuleDisabled));
    }
}
