//! Error types for sweep operations

use dustpan_domain::{CronError, PolicyError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during sweep operations
///
/// Only [`SweepError::Config`], [`SweepError::Io`] and [`SweepError::Toml`]
/// ever reach a caller as `Err`. The per-item variants are logged and
/// counted inside a run.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Configuration error; the sweep does not start
    #[error("Configuration error: {0}")]
    Config(String),

    /// Monitored root missing at sweep time
    #[error("Monitored root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A single file or directory operation failed
    #[error("Failed to delete {}: {source}", path.display())]
    Item {
        /// Path of the entry
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Directory was not empty at removal time
    #[error("Directory not empty at removal time: {}", .0.display())]
    Race(PathBuf),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),

    /// Failed to read or write a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a config file
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<PolicyError> for SweepError {
    fn from(err: PolicyError) -> Self {
        SweepError::Config(err.to_string())
    }
}

impl From<CronError> for SweepError {
    fn from(err: CronError) -> Self {
        SweepError::Config(format!("invalid cron expression: {}", err))
    }
}
