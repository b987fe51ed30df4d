//! Run command implementation.

use crate::error::Result;
use crate::output::Formatter;
use dustpan_sweeper::{SweepConfig, SweepScheduler};

/// Execute the run command: one sweep, right now.
pub async fn execute_run(config: &SweepConfig, dry_run: bool, formatter: &Formatter) -> Result<()> {
    let policy = config.to_policy()?;

    let mut scheduler = SweepScheduler::new();
    scheduler.set_dry_run(dry_run || config.dry_run);
    scheduler.configure(policy);

    let run = scheduler.trigger_once().await?;
    println!("{}", formatter.run_report(&run)?);
    Ok(())
}
