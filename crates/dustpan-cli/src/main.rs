//! Dustpan CLI - Command-line host for the Dustpan sweeper.

use clap::Parser;
use dustpan_cli::commands;
use dustpan_cli::{config, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides the default level)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> dustpan_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    let path = config::resolve_path(cli.config)?;
    let sweep_config = config::load(&path)?;

    match cli.command {
        Command::Run { dry_run } => {
            commands::execute_run(&sweep_config, dry_run, &formatter).await?;
        }
        Command::Watch => {
            commands::execute_watch(&sweep_config, &path, &formatter).await?;
        }
        Command::Check => {
            commands::execute_check(&sweep_config, &formatter)?;
        }
    }

    Ok(())
}
