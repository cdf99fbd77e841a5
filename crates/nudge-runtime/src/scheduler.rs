//! Periodic refresh timer.
//!
//! At most one timer is live at a time. Starting or rescheduling always
//! aborts the previous task before spawning the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Periods are clamped to this range. The upper bound keeps deadline
/// arithmetic on `Instant` from overflowing.
const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Owner of the single polling task.
///
/// Dropping the scheduler stops the timer.
#[derive(Default)]
pub struct PollScheduler {
    handle: Option<JoinHandle<()>>,
    period: Option<Duration>,
    on_tick: Option<TickFn>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_tick` every `period`, first after one full period.
    pub fn start<F>(&mut self, period: Duration, on_tick: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_tick = Some(Arc::new(on_tick));
        self.arm(period);
    }

    /// Restart the timer with a new period, keeping the tick callback.
    ///
    /// Returns `false` when nothing was ever started.
    pub fn reschedule(&mut self, period: Duration) -> bool {
        if self.on_tick.is_none() {
            return false;
        }
        self.arm(period);
        true
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("poll timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Period of the current timer, if one is running.
    pub fn period(&self) -> Option<Duration> {
        self.handle.as_ref().and(self.period)
    }

    fn arm(&mut self, period: Duration) {
        self.stop();
        let Some(on_tick) = self.on_tick.clone() else {
            return;
        };
        let period = period.clamp(MIN_PERIOD, MAX_PERIOD);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // A slow tick pushes the next one back instead of bursting.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        tracing::debug!(?period, "poll timer armed");
        self.handle = Some(handle);
        self.period = Some(period);
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
