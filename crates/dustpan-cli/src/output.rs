//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use chrono::{DateTime, Local, Utc};
use colored::*;
use dustpan_domain::{RulePolicy, SweepRun, BYTES_PER_MB};
use dustpan_sweeper::SweepMetrics;

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of one sweep.
    pub fn run_report(&self, run: &SweepRun) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&run_json(run))?),
            CliFormat::Text => Ok(self.run_text(run)),
        }
    }

    /// Format cumulative metrics.
    pub fn metrics_report(&self, metrics: &SweepMetrics) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let value = serde_json::json!({
                    "sweep_count": metrics.sweep_count,
                    "files_deleted": metrics.files_deleted,
                    "dirs_deleted": metrics.dirs_deleted,
                    "errors": metrics.errors,
                    "skipped": metrics.skipped,
                    "dry_run_candidates": metrics.dry_run_candidates,
                    "throttle_pauses": metrics.throttle_pauses,
                    "cancelled_runs": metrics.cancelled_runs,
                    "total_runtime_secs": metrics.total_runtime.as_secs_f64(),
                    "last_run": metrics.last_run.as_ref().map(run_json),
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            CliFormat::Text => Ok(metrics.summary()),
        }
    }

    /// Format a validated policy and the next time its cron fires.
    pub fn policy_report(&self, policy: &RulePolicy, next_fire: Option<DateTime<Local>>) -> Result<String> {
        let roots: Vec<String> = policy
            .monitored_roots()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let throttle = policy.throttle();

        if self.format == CliFormat::Json {
            let value = serde_json::json!({
                "monitored_roots": roots,
                "exclude_keywords": policy.exclude_keywords(),
                "delete_files": policy.file_deletion(),
                "delete_empty_dirs": policy.empty_dir_deletion(),
                "delete_small_dirs": policy.small_dir_deletion(),
                "size_threshold_bytes": policy.size_threshold_bytes(),
                "cron": policy.cron().map(|c| c.expression().to_string()),
                "next_fire": next_fire.map(|t| t.to_rfc3339()),
                "throttle": throttle.is_enabled().then(|| serde_json::json!({
                    "batch_size": throttle.batch_size(),
                    "min_delay_secs": throttle.delay().min().as_secs_f64(),
                    "max_delay_secs": throttle.delay().max().as_secs_f64(),
                })),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut lines = vec![self.success("Configuration is valid"), String::new()];
        lines.push(self.colorize("Monitored roots:", "cyan"));
        if roots.is_empty() {
            lines.push("  (none)".to_string());
        }
        lines.extend(roots.iter().map(|r| format!("  {}", r)));

        let keywords = if policy.exclude_keywords().is_empty() {
            "(none)".to_string()
        } else {
            policy.exclude_keywords().join(", ")
        };
        lines.push(format!("Exclude keywords: {}", keywords));
        lines.push(format!(
            "Rules: files={}, empty_dirs={}, small_dirs={}",
            on_off(policy.file_deletion()),
            on_off(policy.empty_dir_deletion()),
            on_off(policy.small_dir_deletion())
        ));
        lines.push(format!(
            "Size threshold: {} MB",
            policy.size_threshold_bytes() / BYTES_PER_MB
        ));

        if throttle.is_enabled() {
            lines.push(format!(
                "Throttle: pause {:.1}-{:.1}s after every {} files",
                throttle.delay().min().as_secs_f64(),
                throttle.delay().max().as_secs_f64(),
                throttle.batch_size()
            ));
        } else {
            lines.push("Throttle: off".to_string());
        }

        match (policy.cron(), next_fire) {
            (Some(cron), Some(next)) => {
                lines.push(format!("Schedule: {} (next run {})", cron, next.format("%Y-%m-%d %H:%M")))
            }
            (Some(cron), None) => lines.push(self.warning(&format!("Schedule {} never fires", cron))),
            (None, _) => lines.push("Schedule: none".to_string()),
        }

        Ok(lines.join("\n"))
    }

    fn run_text(&self, run: &SweepRun) -> String {
        let mut lines = Vec::new();
        if run.cancelled {
            lines.push(self.warning("Sweep cancelled before completion"));
        } else if run.errors > 0 {
            lines.push(self.warning(&format!("Sweep finished with {} error(s)", run.errors)));
        } else {
            lines.push(self.success("Sweep finished"));
        }

        lines.push(format!("Run: {}", run.id));
        lines.push(format!("Duration: {:.1}s", run.elapsed().as_secs_f64()));
        lines.push(format!("Files deleted: {}", run.files_deleted));
        lines.push(format!("Directories deleted: {}", run.dirs_deleted));
        lines.push(format!("Skipped: {}", run.skipped));
        lines.push(format!("Errors: {}", run.errors));
        if run.roots_missing > 0 {
            lines.push(format!("Missing roots: {}", run.roots_missing));
        }
        if run.dry_run_candidates > 0 {
            lines.push(self.info(&format!(
                "Dry run: {} entries would be deleted",
                run.dry_run_candidates
            )));
        }
        if run.throttle_pauses > 0 {
            lines.push(format!("Throttle pauses: {}", run.throttle_pauses));
        }
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn run_json(run: &SweepRun) -> serde_json::Value {
    serde_json::json!({
        "id": run.id.to_string(),
        "started_at": DateTime::<Utc>::from(run.started_at).to_rfc3339(),
        "finished_at": run.finished_at.map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
        "elapsed_secs": run.elapsed().as_secs_f64(),
        "files_deleted": run.files_deleted,
        "dirs_deleted": run.dirs_deleted,
        "errors": run.errors,
        "skipped": run.skipped,
        "dry_run_candidates": run.dry_run_candidates,
        "throttle_pauses": run.throttle_pauses,
        "roots_missing": run.roots_missing,
        "cancelled": run.cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_run() -> SweepRun {
        let mut run = SweepRun::start();
        run.files_deleted = 3;
        run.dirs_deleted = 1;
        run.skipped = 7;
        run.finish();
        run
    }

    fn policy() -> RulePolicy {
        RulePolicy::builder()
            .root("/mnt/cloud/movies")
            .keywords_from_csv("keep,sample")
            .file_deletion(true)
            .empty_dir_deletion(true)
            .size_threshold_mb(10)
            .cron("0 3 * * *")
            .build()
            .unwrap()
    }

    #[test]
    fn test_run_text() {
        let formatter = Formatter::new(CliFormat::Text, false);
        let output = formatter.run_report(&finished_run()).unwrap();
        assert!(output.starts_with("✓ Sweep finished"));
        assert!(output.contains("Files deleted: 3"));
        assert!(output.contains("Directories deleted: 1"));
        assert!(!output.contains("Missing roots"));
    }

    #[test]
    fn test_run_text_with_errors() {
        let formatter = Formatter::new(CliFormat::Text, false);
        let mut run = finished_run();
        run.errors = 2;
        run.roots_missing = 1;
        let output = formatter.run_report(&run).unwrap();
        assert!(output.contains("finished with 2 error(s)"));
        assert!(output.contains("Missing roots: 1"));
    }

    #[test]
    fn test_run_json() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let run = finished_run();
        let output = formatter.run_report(&run).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["files_deleted"], 3);
        assert_eq!(value["id"], run.id.to_string());
        assert_eq!(value["cancelled"], false);
        assert!(value["finished_at"].is_string());
    }

    #[test]
    fn test_metrics_json() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let mut metrics = SweepMetrics::new();
        metrics.record_run(&finished_run());
        let value: serde_json::Value =
            serde_json::from_str(&formatter.metrics_report(&metrics).unwrap()).unwrap();
        assert_eq!(value["sweep_count"], 1);
        assert_eq!(value["last_run"]["dirs_deleted"], 1);
    }

    #[test]
    fn test_policy_text() {
        let formatter = Formatter::new(CliFormat::Text, false);
        let output = formatter.policy_report(&policy(), None).unwrap();
        assert!(output.contains("/mnt/cloud/movies"));
        assert!(output.contains("Exclude keywords: keep, sample"));
        assert!(output.contains("files=on, empty_dirs=on, small_dirs=off"));
        assert!(output.contains("Size threshold: 10 MB"));
        assert!(output.contains("Throttle: off"));
    }

    #[test]
    fn test_policy_json() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.policy_report(&policy(), None).unwrap()).unwrap();
        assert_eq!(value["cron"], "0 3 * * *");
        assert_eq!(value["size_threshold_bytes"], 10 * 1024 * 1024);
        assert!(value["throttle"].is_null());
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(CliFormat::Text, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}
