//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dustpan - Sweep small leftover files and empty directories from monitored roots.
#[derive(Debug, Parser)]
#[command(name = "dustpan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "text")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.dustpan/config.toml)
    #[arg(short, long, global = true, env = "DUSTPAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Human-readable text (default)
    Text,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one sweep now and print what it did
    Run {
        /// Log what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply the configuration and keep sweeping on its cron schedule until Ctrl+C
    Watch,

    /// Validate the configuration and show the resolved policy
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["dustpan", "run"]);
        assert!(matches!(cli.command, Command::Run { dry_run: false }));
        assert_eq!(cli.format, CliFormat::Text);
        assert!(!cli.no_color);
    }

    #[test]
    fn test_run_dry_run() {
        let cli = Cli::parse_from(["dustpan", "run", "--dry-run"]);
        assert!(matches!(cli.command, Command::Run { dry_run: true }));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "dustpan",
            "check",
            "--format",
            "json",
            "--no-color",
            "--config",
            "/etc/dustpan.toml",
        ]);
        assert!(matches!(cli.command, Command::Check));
        assert_eq!(cli.format, CliFormat::Json);
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dustpan.toml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["dustpan"]).is_err());
    }

    #[test]
    fn test_watch_command() {
        let cli = Cli::parse_from(["dustpan", "watch"]);
        assert!(matches!(cli.command, Command::Watch));
    }
}
