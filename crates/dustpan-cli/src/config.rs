//! Configuration file handling for the CLI.

use crate::error::{CliError, Result};
use dustpan_domain::traits::ConfigStore;
use dustpan_sweeper::SweepConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file path, `~/.dustpan/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".dustpan").join("config.toml"))
}

/// Use the explicit path if one was given, otherwise the default.
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_path(),
    }
}

/// Load the sweep configuration from a file.
pub fn load(path: &Path) -> Result<SweepConfig> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    Ok(SweepConfig::from_file(path)?)
}

/// Persists configuration changes back to the TOML file.
///
/// Edits the parsed document in place so keys this program doesn't know
/// about survive the rewrite. Comments are not preserved.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// Create a store for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for TomlConfigStore {
    type Error = CliError;

    fn clear_only_once(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let mut table: toml::Table = contents.parse()?;

        table.remove("onlyonce");
        table.insert("only_once".to_string(), toml::Value::Boolean(false));

        fs::write(&self.path, toml::to_string_pretty(&table)?)?;
        tracing::debug!("Cleared one-shot flag in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_explicit_path() {
        let path = resolve_path(Some(PathBuf::from("/etc/dustpan.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/dustpan.toml"));
    }

    #[test]
    fn test_default_path_under_home() {
        if let Ok(path) = default_path() {
            assert!(path.ends_with(".dustpan/config.toml"));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monitor_dirs = [unterminated\n").unwrap();

        let result = load(&path);
        assert!(matches!(
            result,
            Err(CliError::Sweep(dustpan_sweeper::SweepError::Toml(_)))
        ));
    }

    #[test]
    fn test_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monitor_dirs = \"/mnt/a\"\ndelete_files_enabled = true\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.monitor_dirs, "/mnt/a");
        assert!(config.delete_files_enabled);
        assert_eq!(config.size_threshold_mb, 10);
    }

    #[test]
    fn test_clear_only_once_preserves_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "only_once = true\nmonitor_dirs = \"/mnt/a\"\ncron = \"0 3 * * *\"\ncustom = 42\n",
        )
        .unwrap();

        TomlConfigStore::new(&path).clear_only_once().unwrap();

        let config = load(&path).unwrap();
        assert!(!config.only_once);
        assert_eq!(config.monitor_dirs, "/mnt/a");
        assert_eq!(config.cron, "0 3 * * *");
        let table: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(table.get("custom"), Some(&toml::Value::Integer(42)));
    }

    #[test]
    fn test_clear_only_once_replaces_legacy_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "onlyonce = true\n").unwrap();

        TomlConfigStore::new(&path).clear_only_once().unwrap();

        let table: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert!(table.get("onlyonce").is_none());
        assert_eq!(table.get("only_once"), Some(&toml::Value::Boolean(false)));
    }

    #[test]
    fn test_clear_only_once_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = TomlConfigStore::new(dir.path().join("gone.toml"));
        assert!(matches!(store.clear_only_once(), Err(CliError::Io(_))));
    }
}
