//! Dustpan CLI library.
//!
//! This library provides the core functionality for the Dustpan command-line interface,
//! including configuration file handling, command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, CliFormat, Command};
pub use config::TomlConfigStore;
pub use error::{CliError, Result};
pub use output::Formatter;
