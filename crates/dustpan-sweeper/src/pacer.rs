//! Pacers block the sweep between deletion batches

use dustpan_domain::traits::Pacer;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const SLICE: Duration = Duration::from_millis(100);

/// Sleeps the current thread, waking early when the sweep is cancelled
///
/// Only ever used from the sweep's blocking thread, never from an async task.
#[derive(Debug, Clone, Default)]
pub struct SleepPacer {
    cancel: CancellationToken,
}

impl SleepPacer {
    /// Create a pacer that stops sleeping once `cancel` fires
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) {
        // An unrepresentable deadline only ends on cancellation
        let deadline = Instant::now().checked_add(duration);
        while !self.cancel.is_cancelled() {
            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => break,
                Some(deadline) => deadline - now,
                None => SLICE,
            };
            std::thread::sleep(SLICE.min(remaining));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleeps_for_duration() {
        let mut pacer = SleepPacer::default();
        let start = Instant::now();
        pacer.pause(Duration::from_millis(150));
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_cancelled_pacer_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut pacer = SleepPacer::new(cancel);
        let start = Instant::now();
        pacer.pause(Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_unbounded_pause_ends_on_cancel() {
        let cancel = CancellationToken::new();
        let mut pacer = SleepPacer::new(cancel.clone());

        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            cancel.cancel();
        });

        let start = Instant::now();
        pacer.pause(Duration::MAX);
        assert!(start.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }
}
