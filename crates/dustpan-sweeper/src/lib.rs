//! Dustpan Sweeper
//!
//! Scheduled cleanup of small leftover files and empty or near-empty
//! directories under monitored roots.
//!
//! # Overview
//!
//! The sweeper is responsible for:
//! - **Walking**: Visiting every entry below each monitored root, directories post-order
//! - **Deletion**: Removing entries the rule policy marks for deletion, one at a time
//! - **Throttling**: Pausing for a random delay after every batch of deleted files
//! - **Scheduling**: Running sweeps once on demand or on a cron cadence
//! - **Metrics collection**: Counting what each run did
//!
//! # Architecture
//!
//! Each monitored root gets two passes. The file pass removes small files;
//! the directory pass then visits directories children-first, so a parent is
//! evaluated after its children were already processed and a chain of empty
//! directories collapses in a single sweep.
//!
//! ## Directory rules
//!
//! | Rule | Deletes when | Notes |
//! |------|--------------|-------|
//! | **Files** | size <= threshold | Only regular files; symlinks are never followed |
//! | **Small directories** | direct file bytes < threshold | Still needs the directory to be empty at removal time |
//! | **Empty directories** | no children | Checked after the small-directory rule |
//!
//! An entry whose path contains an exclusion keyword is always kept. The
//! monitored root itself is never deleted.
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use dustpan_sweeper::{SleepPacer, SweepConfig, Sweeper};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SweepConfig::from_file("/etc/dustpan/config.toml")?;
//! let sweeper = Sweeper::new(Arc::new(config.to_policy()?));
//!
//! let cancel = CancellationToken::new();
//! let run = sweeper.sweep(SleepPacer::new(cancel.clone()), &cancel);
//! println!("{}", run);
//! # Ok(())
//! # }
//! ```
//!
//! ## Recurring Sweep
//!
//! ```no_run
//! use dustpan_sweeper::{SweepConfig, SweepScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SweepConfig::from_file("/etc/dustpan/config.toml")?;
//!     let mut scheduler = SweepScheduler::new();
//!     scheduler.configure(config.to_policy()?);
//!     scheduler.schedule_recurring("0 3 * * *")?;
//!
//!     // Run until Ctrl+C
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.stop();
//!     println!("{}", scheduler.metrics().summary());
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! The sweeper can be configured via TOML:
//!
//! ```toml
//! enabled = true
//! only_once = false
//! monitor_dirs = """
//! /mnt/cloud/movies
//! /mnt/cloud/series
//! """
//! keywords = "keep,sample"
//! delete_files_enabled = true
//! delete_empty_dirs_enabled = true
//! delete_small_dirs_enabled = false
//! size_threshold_mb = 10
//! cron = "0 3 * * *"
//! delay = "20,1-3"
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod metrics;
mod pacer;
mod scheduler;
mod sweeper;
mod walker;

pub use config::SweepConfig;
pub use error::SweepError;
pub use executor::{DeletionExecutor, Outcome};
pub use metrics::SweepMetrics;
pub use pacer::SleepPacer;
pub use scheduler::{next_fire, SchedulerState, SweepScheduler};
pub use sweeper::Sweeper;
pub use walker::{TreeWalker, WalkIssue};
