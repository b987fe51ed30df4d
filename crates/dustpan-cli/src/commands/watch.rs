//! Watch command implementation.

use crate::config::TomlConfigStore;
use crate::error::Result;
use crate::output::Formatter;
use dustpan_sweeper::{SchedulerState, SweepConfig, SweepScheduler};
use std::path::Path;

/// Execute the watch command.
///
/// Applies the configuration the way a settings change would: a one-shot
/// sweep if `only_once` is set (clearing the flag in the config file), then
/// the recurring cron trigger if `enabled`. Blocks until Ctrl+C.
pub async fn execute_watch(config: &SweepConfig, config_path: &Path, formatter: &Formatter) -> Result<()> {
    let store = TomlConfigStore::new(config_path);
    let mut scheduler = SweepScheduler::new();

    if let Some(run) = scheduler.apply_config(config, &store).await? {
        println!("{}", formatter.run_report(&run)?);
    }

    if scheduler.state() != SchedulerState::ScheduledRecurring {
        eprintln!(
            "{}",
            formatter.warning("No recurring schedule (needs 'enabled = true' and a valid 'cron'); nothing to watch")
        );
        return Ok(());
    }

    if let Some(next) = scheduler.next_fire_time() {
        eprintln!(
            "{}",
            formatter.info(&format!(
                "Watching, next sweep at {}. Press Ctrl+C to stop.",
                next.format("%Y-%m-%d %H:%M")
            ))
        );
    }

    tokio::signal::ctrl_c().await?;
    scheduler.stop();

    println!("{}", formatter.metrics_report(&scheduler.metrics())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliFormat;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_watch_one_shot_without_schedule_returns() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("media");
        fs::create_dir_all(root.join("empty")).unwrap();

        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            format!(
                "only_once = true\nmonitor_dirs = \"{}\"\ndelete_empty_dirs_enabled = true\n",
                root.display()
            ),
        )
        .unwrap();
        let config = crate::config::load(&path).unwrap();

        let formatter = Formatter::new(CliFormat::Text, false);
        execute_watch(&config, &path, &formatter).await.unwrap();

        assert!(!root.join("empty").exists());
        assert!(!crate::config::load(&path).unwrap().only_once);
    }
}
