//! Check command implementation.

use crate::error::Result;
use crate::output::Formatter;
use chrono::Local;
use dustpan_sweeper::{next_fire, SweepConfig};

/// Execute the check command: validate the configuration and print the resolved policy.
pub fn execute_check(config: &SweepConfig, formatter: &Formatter) -> Result<()> {
    let policy = config.to_policy()?;
    let next = policy.cron().and_then(|cron| next_fire(cron, &Local::now()));

    if !config.enabled && policy.cron().is_some() {
        eprintln!(
            "{}",
            formatter.warning("A cron schedule is set but 'enabled' is false; it will not run")
        );
    }

    println!("{}", formatter.policy_report(&policy, next)?);
    Ok(())
}
