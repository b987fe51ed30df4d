//! Policy module - the validated snapshot a sweep runs against
//!
//! A [`RulePolicy`] is built once from configuration input through
//! [`RulePolicyBuilder`] and never mutated afterwards. Malformed input is
//! rejected here, at the boundary, so evaluation code only ever sees valid
//! values.

use crate::cron::{CronError, CronSchedule};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Bytes per megabyte used for `size_threshold_mb` conversions
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Size threshold used when none is configured
pub const DEFAULT_THRESHOLD_MB: u64 = 10;

/// Longest single throttle pause accepted
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Error raised when a policy cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Monitored root is not an absolute path
    #[error("monitored root '{}' is not an absolute path", .0.display())]
    RelativeRoot(PathBuf),

    /// Cron expression is malformed
    #[error("invalid cron expression '{expression}': {source}")]
    InvalidCron {
        /// Expression as given
        expression: String,
        /// Parse failure
        #[source]
        source: CronError,
    },

    /// Delay specification is malformed
    #[error("invalid delay '{0}', expected '<batch>,<min>-<max>'")]
    InvalidDelay(String),

    /// Size threshold does not fit in a byte count
    #[error("size threshold of {0} MB is too large")]
    ThresholdOverflow(u64),
}

/// Inclusive range a throttle pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Create a range; `min` must not exceed `max`, nor `max` [`MAX_DELAY`]
    pub fn new(min: Duration, max: Duration) -> Result<Self, PolicyError> {
        if min > max || max > MAX_DELAY {
            return Err(PolicyError::InvalidDelay(format!(
                "{}-{}",
                min.as_secs_f64(),
                max.as_secs_f64()
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower bound
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> Duration {
        self.max
    }
}

/// Pause inserted after every `batch_size` file deletions
///
/// # Examples
///
/// ```
/// use dustpan_domain::Throttle;
/// use std::time::Duration;
///
/// let throttle = Throttle::parse("10,2-5").unwrap();
/// assert_eq!(throttle.batch_size(), 10);
/// assert_eq!(throttle.delay().min(), Duration::from_secs(2));
/// assert_eq!(throttle.delay().max(), Duration::from_secs(5));
///
/// // Malformed specs fall back to no throttling
/// assert!(!Throttle::parse_lenient("abc").is_enabled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    batch_size: u32,
    delay: DelayRange,
}

impl Throttle {
    /// No throttling at all
    pub const NONE: Throttle = Throttle {
        batch_size: 0,
        delay: DelayRange {
            min: Duration::ZERO,
            max: Duration::ZERO,
        },
    };

    /// Create a throttle pausing for `delay` after every `batch_size` deletions
    pub fn new(batch_size: u32, delay: DelayRange) -> Self {
        Self { batch_size, delay }
    }

    /// Parse `"<batch>,<min>-<max>"` (seconds, fractions allowed)
    ///
    /// `"<batch>,<secs>"` is a fixed delay. A blank string means no throttling.
    pub fn parse(spec: &str) -> Result<Self, PolicyError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::NONE);
        }

        let invalid = || PolicyError::InvalidDelay(spec.to_string());

        let (batch, range) = spec.split_once(',').ok_or_else(invalid)?;
        let batch_size: u32 = batch.trim().parse().map_err(|_| invalid())?;

        let (min, max) = match range.split_once('-') {
            Some((min, max)) => (parse_seconds(min).ok_or_else(invalid)?, parse_seconds(max).ok_or_else(invalid)?),
            None => {
                let secs = parse_seconds(range).ok_or_else(invalid)?;
                (secs, secs)
            }
        };

        if min > max {
            return Err(invalid());
        }

        Ok(Self::new(batch_size, DelayRange { min, max }))
    }

    /// Parse like [`Throttle::parse`], falling back to [`Throttle::NONE`]
    pub fn parse_lenient(spec: &str) -> Self {
        Self::parse(spec).unwrap_or(Self::NONE)
    }

    /// Number of file deletions between pauses
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Range a pause is drawn from
    pub fn delay(&self) -> DelayRange {
        self.delay
    }

    /// Whether this throttle ever pauses
    pub fn is_enabled(&self) -> bool {
        self.batch_size > 0 && !self.delay.max.is_zero()
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::NONE
    }
}

fn parse_seconds(text: &str) -> Option<Duration> {
    let secs: f64 = text.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok().filter(|d| *d <= MAX_DELAY)
}

/// Immutable snapshot of the sweep configuration
///
/// # Examples
///
/// ```
/// use dustpan_domain::RulePolicy;
///
/// let policy = RulePolicy::builder()
///     .roots_from_lines("/mnt/cloud/movies\n\n/mnt/cloud/tv\n/mnt/cloud/movies")
///     .keywords_from_csv("keep, .partial,")
///     .file_deletion(true)
///     .size_threshold_mb(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.monitored_roots().len(), 2);
/// assert_eq!(policy.exclude_keywords(), ["keep", ".partial"]);
/// assert_eq!(policy.size_threshold_bytes(), 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePolicy {
    monitored_roots: Vec<PathBuf>,
    exclude_keywords: Vec<String>,
    file_deletion: bool,
    empty_dir_deletion: bool,
    small_dir_deletion: bool,
    size_threshold_bytes: u64,
    cron: Option<CronSchedule>,
    throttle: Throttle,
}

impl RulePolicy {
    /// Start building a policy
    pub fn builder() -> RulePolicyBuilder {
        RulePolicyBuilder::default()
    }

    /// Monitored roots, in configuration order, without duplicates
    pub fn monitored_roots(&self) -> &[PathBuf] {
        &self.monitored_roots
    }

    /// Exclusion keywords (never empty strings)
    pub fn exclude_keywords(&self) -> &[String] {
        &self.exclude_keywords
    }

    /// Whether the file rule is active
    pub fn file_deletion(&self) -> bool {
        self.file_deletion
    }

    /// Whether the empty-directory rule is active
    pub fn empty_dir_deletion(&self) -> bool {
        self.empty_dir_deletion
    }

    /// Whether the small-directory rule is active
    pub fn small_dir_deletion(&self) -> bool {
        self.small_dir_deletion
    }

    /// Whether any directory rule is active
    pub fn dir_deletion(&self) -> bool {
        self.empty_dir_deletion || self.small_dir_deletion
    }

    /// Size threshold in bytes
    pub fn size_threshold_bytes(&self) -> u64 {
        self.size_threshold_bytes
    }

    /// Recurring schedule, if any
    pub fn cron(&self) -> Option<&CronSchedule> {
        self.cron.as_ref()
    }

    /// Throttle applied to file deletions
    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// First exclusion keyword contained in `path`, if any
    pub fn matching_keyword(&self, path: &Path) -> Option<&str> {
        let text = path.to_string_lossy();
        self.exclude_keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

/// Builder for [`RulePolicy`]
///
/// Every rule starts disabled and the size threshold starts at 10 MB.
#[derive(Debug, Clone)]
pub struct RulePolicyBuilder {
    roots: Vec<PathBuf>,
    keywords: Vec<String>,
    file_deletion: bool,
    empty_dir_deletion: bool,
    small_dir_deletion: bool,
    size_threshold_mb: u64,
    cron: Option<String>,
    throttle: Throttle,
}

impl Default for RulePolicyBuilder {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            keywords: Vec::new(),
            file_deletion: false,
            empty_dir_deletion: false,
            small_dir_deletion: false,
            size_threshold_mb: DEFAULT_THRESHOLD_MB,
            cron: None,
            throttle: Throttle::NONE,
        }
    }
}

impl RulePolicyBuilder {
    /// Add a monitored root
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Add newline-delimited roots; blank lines are ignored
    pub fn roots_from_lines(mut self, text: &str) -> Self {
        self.roots.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from),
        );
        self
    }

    /// Add an exclusion keyword
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Add comma-delimited keywords; blank items are ignored
    pub fn keywords_from_csv(mut self, text: &str) -> Self {
        self.keywords.extend(
            text.split(',')
                .map(str::trim)
                .filter(|kw| !kw.is_empty())
                .map(String::from),
        );
        self
    }

    /// Toggle the file rule
    pub fn file_deletion(mut self, enabled: bool) -> Self {
        self.file_deletion = enabled;
        self
    }

    /// Toggle the empty-directory rule
    pub fn empty_dir_deletion(mut self, enabled: bool) -> Self {
        self.empty_dir_deletion = enabled;
        self
    }

    /// Toggle the small-directory rule
    pub fn small_dir_deletion(mut self, enabled: bool) -> Self {
        self.small_dir_deletion = enabled;
        self
    }

    /// Size threshold in megabytes
    pub fn size_threshold_mb(mut self, mb: u64) -> Self {
        self.size_threshold_mb = mb;
        self
    }

    /// Recurring schedule; blank means none
    pub fn cron(mut self, expression: impl Into<String>) -> Self {
        self.cron = Some(expression.into());
        self
    }

    /// Throttle for file deletions
    pub fn throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Validate and build the policy
    pub fn build(self) -> Result<RulePolicy, PolicyError> {
        let mut monitored_roots: Vec<PathBuf> = Vec::with_capacity(self.roots.len());
        for root in self.roots {
            if !root.is_absolute() {
                return Err(PolicyError::RelativeRoot(root));
            }
            if !monitored_roots.contains(&root) {
                monitored_roots.push(root);
            }
        }

        let mut exclude_keywords: Vec<String> = Vec::with_capacity(self.keywords.len());
        for keyword in self.keywords {
            if !keyword.is_empty() && !exclude_keywords.contains(&keyword) {
                exclude_keywords.push(keyword);
            }
        }

        let size_threshold_bytes = self
            .size_threshold_mb
            .checked_mul(BYTES_PER_MB)
            .ok_or(PolicyError::ThresholdOverflow(self.size_threshold_mb))?;

        let cron = match self.cron.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(expression) => Some(CronSchedule::parse(expression).map_err(|source| {
                PolicyError::InvalidCron {
                    expression: expression.to_string(),
                    source,
                }
            })?),
        };

        Ok(RulePolicy {
            monitored_roots,
            exclude_keywords,
            file_deletion: self.file_deletion,
            empty_dir_deletion: self.empty_dir_deletion,
            small_dir_deletion: self.small_dir_deletion,
            size_threshold_bytes,
            cron,
            throttle: self.throttle,
        })
    }
}
