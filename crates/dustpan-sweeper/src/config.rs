//! Configuration input for sweep operations
//!
//! [`SweepConfig`] is the permissive, string-shaped structure a host hands
//! over (TOML file, settings form). [`SweepConfig::to_policy`] turns it into a
//! validated [`RulePolicy`].

use crate::SweepError;
use dustpan_domain::{CronSchedule, RulePolicy, Throttle, DEFAULT_THRESHOLD_MB};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the sweeper
///
/// Key names from older settings forms (`onlyonce`, `delete_empty_dirs`,
/// `delete_small_dirs`, `small_dir_size_threshold`) are accepted as aliases.
///
/// # Examples
///
/// ```
/// use dustpan_sweeper::SweepConfig;
///
/// let config = SweepConfig::from_toml_str(r#"
///     enabled = true
///     monitor_dirs = "/mnt/cloud/movies"
///     keywords = "keep,sample"
///     delete_files_enabled = true
///     size_threshold_mb = 10
///     cron = "0 3 * * *"
///     delay = "20,1-3"
/// "#).unwrap();
///
/// let policy = config.to_policy().unwrap();
/// assert_eq!(policy.exclude_keywords(), ["keep", "sample"]);
/// assert!(policy.cron().is_some());
/// assert_eq!(policy.throttle().batch_size(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Enable the recurring trigger
    #[serde(default)]
    pub enabled: bool,

    /// Run one sweep immediately, then clear this flag
    #[serde(default, alias = "onlyonce")]
    pub only_once: bool,

    /// Monitored roots, one absolute path per line
    #[serde(default)]
    pub monitor_dirs: String,

    /// Comma-separated exclusion keywords
    #[serde(default)]
    pub keywords: String,

    /// Delete files at or below the size threshold
    #[serde(default)]
    pub delete_files_enabled: bool,

    /// Delete directories with no children
    #[serde(default, alias = "delete_empty_dirs")]
    pub delete_empty_dirs_enabled: bool,

    /// Delete directories whose direct files total less than the threshold
    #[serde(default, alias = "delete_small_dirs")]
    pub delete_small_dirs_enabled: bool,

    /// Size threshold in megabytes
    /// Default: 10
    #[serde(default = "default_size_threshold_mb", alias = "small_dir_size_threshold")]
    pub size_threshold_mb: u64,

    /// 5-field cron expression; blank disables the recurring trigger
    #[serde(default)]
    pub cron: String,

    /// Throttle as `"<batch>,<min>-<max>"` seconds; blank disables it
    #[serde(default)]
    pub delay: String,

    /// Dry-run mode: log what would be deleted without deleting
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

fn default_size_threshold_mb() -> u64 {
    DEFAULT_THRESHOLD_MB
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            only_once: false,
            monitor_dirs: String::new(),
            keywords: String::new(),
            delete_files_enabled: false,
            delete_empty_dirs_enabled: false,
            delete_small_dirs_enabled: false,
            size_threshold_mb: default_size_threshold_mb(),
            cron: String::new(),
            delay: String::new(),
            dry_run: false,
        }
    }
}

impl SweepConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SweepError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, SweepError> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the validated policy
    ///
    /// Parsing is tolerant where the input format allows it: a malformed
    /// `delay` means no throttling and a malformed `cron` means no recurring
    /// trigger, both logged as warnings. Relative roots and oversized
    /// thresholds are rejected.
    pub fn to_policy(&self) -> Result<RulePolicy, SweepError> {
        let throttle = match Throttle::parse(&self.delay) {
            Ok(throttle) => throttle,
            Err(e) => {
                tracing::warn!("{}; throttling disabled", e);
                Throttle::NONE
            }
        };

        let mut builder = RulePolicy::builder()
            .roots_from_lines(&self.monitor_dirs)
            .keywords_from_csv(&self.keywords)
            .file_deletion(self.delete_files_enabled)
            .empty_dir_deletion(self.delete_empty_dirs_enabled)
            .small_dir_deletion(self.delete_small_dirs_enabled)
            .size_threshold_mb(self.size_threshold_mb)
            .throttle(throttle);

        let cron = self.cron.trim();
        if !cron.is_empty() {
            match CronSchedule::parse(cron) {
                Ok(_) => builder = builder.cron(cron),
                Err(e) => {
                    tracing::warn!("Invalid cron expression '{}': {}; recurring sweep disabled", cron, e);
                }
            }
        }

        Ok(builder.build()?)
    }
}
