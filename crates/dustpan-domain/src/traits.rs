//! Trait definitions for external interactions
//!
//! These traits define the boundaries between sweep logic and infrastructure.
//! Implementations live in other crates.

use std::time::Duration;

/// Blocks the sweep's execution context between deletion batches
///
/// Implemented by the sweeper (sleeping pacer) and by tests (recording pacer).
pub trait Pacer {
    /// Pause for `duration`
    fn pause(&mut self, duration: Duration);
}

/// Persists configuration changes made by the sweep itself
///
/// Implemented by the host layer (dustpan-cli writes back to its TOML file)
pub trait ConfigStore {
    /// Error type for store operations
    type Error;

    /// Clear the one-shot flag after a one-shot run completed
    fn clear_only_once(&self) -> Result<(), Self::Error>;
}
