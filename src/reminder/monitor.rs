//! Periodic monitor loop and display throttling.
//!
//! Every tick the monitor sweeps for due reminders. Every cleanup interval it reaps finished
//! ones. Display updates between firings are rate limited by [`DisplayThrottle`].

use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::time::{Instant, MissedTickBehavior};

use super::scheduler::WeakScheduler;
use super::types::Reminder;

pub(crate) async fn run(scheduler: WeakScheduler, tick: Duration, cleanup: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut throttle = DisplayThrottle::new();
    let mut last_cleanup = Instant::now();

    loop {
        interval.tick().await;
        let Some(scheduler) = scheduler.upgrade() else {
            tracing::debug!("scheduler dropped, monitor exiting");
            return;
        };

        let fired = scheduler.sweep();

        if last_cleanup.elapsed() >= cleanup {
            scheduler.reap();
            last_cleanup = Instant::now();
        }

        let urgent_secs = scheduler.config().urgent_threshold_secs as i64;
        let changed = throttle.observe(&scheduler.get_active(), scheduler.now(), urgent_secs);
        // sweep already refreshed the display for firings
        if changed && fired == 0 {
            scheduler.notify_display();
        }
    }
}

/// Decides when a countdown display needs refreshing.
///
/// Each pending reminder falls into a bucket: its remaining whole seconds while inside the
/// urgent window, its remaining whole minutes outside it. The display is refreshed when any
/// bucket changes or the set of pending reminders changes.
#[derive(Debug, Default)]
pub struct DisplayThrottle {
    last: Vec<(String, Bucket)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Seconds(i64),
    Minutes(i64),
}

impl DisplayThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pending set at `now`. Returns `true` when the display should refresh.
    pub fn observe(&mut self, active: &[Reminder], now: NaiveDateTime, urgent_secs: i64) -> bool {
        let current: Vec<(String, Bucket)> = active
            .iter()
            .map(|r| {
                let secs = r.time_remaining(now).num_seconds();
                let bucket = if secs <= urgent_secs {
                    Bucket::Seconds(secs)
                } else {
                    Bucket::Minutes(secs / 60)
                };
                (r.id.clone(), bucket)
            })
            .collect();

        let changed = current != self.last;
        self.last = current;
        changed
    }
}
