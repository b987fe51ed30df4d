//! Scheduling of sweep runs: one-shot and recurring on a cron cadence

use crate::pacer::SleepPacer;
use crate::{SweepConfig, SweepError, SweepMetrics, Sweeper};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use dustpan_domain::traits::ConfigStore;
use dustpan_domain::{CronSchedule, RulePolicy, SweepRun};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of a [`SweepScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Configured (or fresh) with no recurring trigger
    Idle,
    /// A cron trigger is armed
    ScheduledRecurring,
    /// A manually requested sweep is running
    RunningOnce,
    /// Stopped by the caller
    Stopped,
}

impl SchedulerState {
    /// State name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::ScheduledRecurring => "scheduled",
            SchedulerState::RunningOnce => "running",
            SchedulerState::Stopped => "stopped",
        }
    }
}

struct Recurring {
    schedule: CronSchedule,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
struct Settings {
    policy: Arc<RulePolicy>,
    dry_run: bool,
}

struct Inner {
    settings: Mutex<Option<Settings>>,
    state: Mutex<SchedulerState>,
    // Held for the whole duration of a sweep
    run_lock: Arc<tokio::sync::Mutex<()>>,
    sweep_cancel: Mutex<CancellationToken>,
    metrics: Mutex<SweepMetrics>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one sweep while holding the run lock
///
/// The lock guard, metrics and state bookkeeping live on the blocking thread,
/// so they complete even when the caller stops awaiting.
async fn execute(inner: Arc<Inner>, running: OwnedMutexGuard<()>) -> Result<SweepRun, SweepError> {
    let settings = lock(&inner.settings)
        .clone()
        .ok_or_else(|| SweepError::Config("no policy configured".to_string()))?;
    let cancel = lock(&inner.sweep_cancel).clone();

    let previous = {
        let mut state = lock(&inner.state);
        let previous = *state;
        if matches!(previous, SchedulerState::Idle | SchedulerState::Stopped) {
            *state = SchedulerState::RunningOnce;
        }
        previous
    };

    let worker = Arc::clone(&inner);
    let result = tokio::task::spawn_blocking(move || {
        let run = Sweeper::new(settings.policy)
            .with_dry_run(settings.dry_run)
            .sweep(SleepPacer::new(cancel.clone()), &cancel);
        lock(&worker.metrics).record_run(&run);
        worker.restore_state(previous);
        drop(running);
        run
    })
    .await;

    result.map_err(|e| {
        inner.restore_state(previous);
        SweepError::Worker(e.to_string())
    })
}

impl Inner {
    fn restore_state(&self, previous: SchedulerState) {
        let mut state = lock(&self.state);
        if *state == SchedulerState::RunningOnce {
            *state = previous;
        }
    }
}

/// Drives sweeps once on demand or repeatedly on a cron cadence
///
/// At most one sweep runs at a time. Manual triggers wait for a running
/// sweep to finish; a cron tick that fires while a sweep is running is
/// dropped.
///
/// # Examples
///
/// ```no_run
/// use dustpan_domain::RulePolicy;
/// use dustpan_sweeper::SweepScheduler;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let policy = RulePolicy::builder()
///         .root("/mnt/cloud/movies")
///         .empty_dir_deletion(true)
///         .build()?;
///
///     let mut scheduler = SweepScheduler::new();
///     scheduler.configure(policy);
///
///     // Sweep right now
///     let run = scheduler.trigger_once().await?;
///     println!("{}", run);
///
///     // Then every night at 03:00 until Ctrl+C
///     scheduler.schedule_recurring("0 3 * * *")?;
///     tokio::signal::ctrl_c().await?;
///     scheduler.stop();
///     Ok(())
/// }
/// ```
pub struct SweepScheduler {
    inner: Arc<Inner>,
    recurring: Option<Recurring>,
    dry_run: bool,
}

impl SweepScheduler {
    /// Create an idle scheduler with no policy
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                settings: Mutex::new(None),
                state: Mutex::new(SchedulerState::Idle),
                run_lock: Arc::new(tokio::sync::Mutex::new(())),
                sweep_cancel: Mutex::new(CancellationToken::new()),
                metrics: Mutex::new(SweepMetrics::new()),
            }),
            recurring: None,
            dry_run: false,
        }
    }

    /// Log decisions instead of deleting, from the next `configure` on
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        *lock(&self.inner.state)
    }

    /// Snapshot of cumulative metrics
    pub fn metrics(&self) -> SweepMetrics {
        lock(&self.inner.metrics).clone()
    }

    /// The configured policy, if any
    pub fn policy(&self) -> Option<Arc<RulePolicy>> {
        lock(&self.inner.settings).as_ref().map(|s| Arc::clone(&s.policy))
    }

    /// Install a new policy and return to `Idle`
    ///
    /// Any recurring trigger is discarded and a sweep in progress is asked
    /// to stop at its next entry.
    pub fn configure(&mut self, policy: RulePolicy) {
        self.cancel_recurring();
        self.cancel_in_flight();

        tracing::info!(
            "Configured sweep over {} root(s): files={}, empty_dirs={}, small_dirs={}, threshold={} bytes",
            policy.monitored_roots().len(),
            policy.file_deletion(),
            policy.empty_dir_deletion(),
            policy.small_dir_deletion(),
            policy.size_threshold_bytes()
        );

        *lock(&self.inner.settings) = Some(Settings {
            policy: Arc::new(policy),
            dry_run: self.dry_run,
        });
        *lock(&self.inner.state) = SchedulerState::Idle;
    }

    /// Run exactly one sweep and return its counters
    ///
    /// Waits for a sweep that is already running to finish first. Dropping
    /// the returned future does not abandon a sweep that has started; it
    /// keeps the run lock until it finishes and is still recorded.
    pub async fn trigger_once(&self) -> Result<SweepRun, SweepError> {
        let running = Arc::clone(&self.inner.run_lock).lock_owned().await;
        execute(Arc::clone(&self.inner), running).await
    }

    /// Arm a recurring trigger on a 5-field cron expression
    ///
    /// Rejects malformed expressions and requires a configured policy.
    /// Must be called from within a tokio runtime.
    pub fn schedule_recurring(&mut self, expression: &str) -> Result<(), SweepError> {
        let schedule = CronSchedule::parse(expression)?;
        if lock(&self.inner.settings).is_none() {
            return Err(SweepError::Config("no policy configured".to_string()));
        }

        self.cancel_recurring();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(recurring_loop(
            Arc::clone(&self.inner),
            schedule.clone(),
            cancel.clone(),
        ));
        match next_fire(&schedule, &Local::now()) {
            Some(next) => tracing::info!("Recurring sweep scheduled ({}), next run at {}", schedule, next),
            None => tracing::warn!("Recurring sweep scheduled ({}) but it never fires", schedule),
        }

        self.recurring = Some(Recurring {
            schedule,
            cancel,
            handle,
        });
        *lock(&self.inner.state) = SchedulerState::ScheduledRecurring;
        Ok(())
    }

    /// Next time the recurring trigger fires, if one is armed
    pub fn next_fire_time(&self) -> Option<DateTime<Local>> {
        let recurring = self.recurring.as_ref()?;
        next_fire(&recurring.schedule, &Local::now())
    }

    /// Cancel any recurring trigger and in-flight sweep; idempotent
    pub fn stop(&mut self) {
        let had_trigger = self.cancel_recurring();
        self.cancel_in_flight();
        *lock(&self.inner.state) = SchedulerState::Stopped;
        if had_trigger {
            tracing::info!("Sweep scheduler stopped");
        }
    }

    /// Apply host configuration the way a settings change would
    ///
    /// Builds the policy, configures the scheduler, runs a one-shot sweep if
    /// `only_once` is set (then clears the flag through `store`), and arms the
    /// recurring trigger when `enabled` and a valid cron is present. Returns
    /// the one-shot run, if any.
    pub async fn apply_config<S>(&mut self, config: &SweepConfig, store: &S) -> Result<Option<SweepRun>, SweepError>
    where
        S: ConfigStore,
        S::Error: std::fmt::Display,
    {
        // A rejected config must not leave the previous trigger armed
        if self.cancel_recurring() {
            *lock(&self.inner.state) = SchedulerState::Idle;
        }
        let policy = config.to_policy()?;
        let cron = policy.cron().cloned();

        self.set_dry_run(config.dry_run);
        self.configure(policy);

        let mut one_shot = None;
        if config.only_once {
            tracing::info!("One-shot sweep requested, running now");
            let run = self.trigger_once().await?;
            if let Err(e) = store.clear_only_once() {
                tracing::error!("Failed to clear one-shot flag: {}", e);
            }
            one_shot = Some(run);
        }

        if config.enabled {
            match cron {
                Some(schedule) => self.schedule_recurring(schedule.expression())?,
                None => tracing::info!("No cron schedule configured, recurring sweep disabled"),
            }
        }

        Ok(one_shot)
    }

    fn cancel_recurring(&mut self) -> bool {
        match self.recurring.take() {
            Some(recurring) => {
                // The loop exits at its next await; aborting could orphan a blocking sweep
                recurring.cancel.cancel();
                drop(recurring.handle);
                true
            }
            None => false,
        }
    }

    fn cancel_in_flight(&self) {
        let mut token = lock(&self.inner.sweep_cancel);
        token.cancel();
        *token = CancellationToken::new();
    }
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        self.cancel_recurring();
        self.cancel_in_flight();
    }
}

async fn recurring_loop(inner: Arc<Inner>, schedule: CronSchedule, cancel: CancellationToken) {
    loop {
        let now = Local::now();
        let Some(next) = next_fire(&schedule, &now) else {
            tracing::warn!("Cron schedule {} has no upcoming fire time", schedule);
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        let running = match Arc::clone(&inner.run_lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Previous sweep still running, skipping tick at {}", next);
                continue;
            }
        };

        tracing::debug!("Cron tick at {}", next);
        if let Err(e) = execute(Arc::clone(&inner), running).await {
            tracing::error!("Scheduled sweep failed: {}", e);
        }

        if cancel.is_cancelled() {
            return;
        }
    }
}

/// First minute strictly after `after` that matches `schedule`
///
/// Searches up to five years ahead; returns `None` for schedules that never
/// match (e.g. February 31st). Local times skipped by a DST change are
/// skipped.
pub fn next_fire<Tz: TimeZone>(schedule: &CronSchedule, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = after.timezone();
    let start = after.naive_local().with_second(0)?.with_nanosecond(0)? + TimeDelta::minutes(1);
    let limit = start + TimeDelta::days(5 * 366);

    let mut t = start;
    while t <= limit {
        if !schedule.matches_month(t.month()) {
            t = first_of_next_month(t)?;
            continue;
        }
        if !schedule.matches_day(t.day(), t.weekday().num_days_from_sunday()) {
            t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
            continue;
        }
        if !schedule.matches_hour(t.hour()) {
            t = t.date().and_hms_opt(t.hour(), 0, 0)? + TimeDelta::hours(1);
            continue;
        }
        if !schedule.matches_minute(t.minute()) {
            t += TimeDelta::minutes(1);
            continue;
        }
        if let Some(fire) = tz.from_local_datetime(&t).earliest() {
            return Some(fire);
        }
        t += TimeDelta::minutes(1);
    }

    None
}

fn first_of_next_month(t: NaiveDateTime) -> Option<NaiveDateTime> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}
