//! Fixed-interval poll timer.
//!
//! One [`PollTimer`] exists per active chat session. Dropping it aborts the
//! background task, so tearing down a view can never leave repeated calls
//! running behind it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Repeating timer running on the tokio runtime.
#[derive(Debug)]
pub struct PollTimer {
    handle: JoinHandle<()>,
    period: Duration,
}

impl PollTimer {
    /// Start calling `on_tick` every `period`, first after one full period.
    ///
    /// The timer stops by itself once `on_tick` returns `false` (typically
    /// because the receiving side of a channel is gone).
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !on_tick() {
                    debug!("poll receiver gone, stopping timer");
                    break;
                }
            }
        });
        debug!(period_ms = period.as_millis(), "poll timer started");
        Self { handle, period }
    }

    /// Interval between two ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the background task is still alive.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("poll timer cancelled");
    }
}
