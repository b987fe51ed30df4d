//! Dustpan Domain Layer
//!
//! This crate contains the rules and value objects of a filesystem retention
//! sweep. It performs no I/O: everything here is either an immutable value or
//! a pure function over values, and the infrastructure crates depend on it.
//!
//! ## Key Concepts
//!
//! - **RulePolicy**: Validated snapshot of what a sweep may delete
//! - **FileSystemEntry**: A file or directory observed during traversal
//! - **RuleEvaluator**: Pure keep/delete decision with a reason
//! - **CronSchedule**: 5-field cron cadence for recurring sweeps
//! - **SweepRun**: Counters for one execution of the sweep
//!
//! ## Architecture
//!
//! - Minimal dependencies: `uuid` for run identifiers, `thiserror` for error types
//! - Trait definitions for the seams the sweeper plugs into (pacing, config persistence)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cron;
pub mod entry;
pub mod evaluator;
pub mod policy;
pub mod run;
pub mod traits;

// Re-exports for convenience
pub use cron::{CronError, CronSchedule};
pub use entry::{EntryKind, FileSystemEntry};
pub use evaluator::{Decision, DeleteReason, KeepReason, RuleEvaluator};
pub use policy::{
    DelayRange, PolicyError, RulePolicy, RulePolicyBuilder, Throttle, BYTES_PER_MB, DEFAULT_THRESHOLD_MB, MAX_DELAY,
};
pub use run::{RunId, SweepRun};
