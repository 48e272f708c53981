//! The [`Reminder`] record.
//!
//! Reminders are owned by [`ReminderScheduler`](super::ReminderScheduler); callers only ever
//! see clones.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

/// A single reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    /// UUID v7, assigned at creation.
    pub id: String,
    /// What to remind about.
    pub task: String,
    /// Local wall-clock instant the reminder fires at. Only snooze rewrites it.
    pub scheduled_time: NaiveDateTime,
    pub created_time: NaiveDateTime,
    /// `false` once cancelled. An inactive reminder never fires.
    pub is_active: bool,
    /// `true` once fired. Reset only by snooze.
    pub is_completed: bool,
    /// The utterance the reminder was created from.
    pub original_text: String,
}

impl Reminder {
    pub fn new(
        task: impl Into<String>,
        scheduled_time: NaiveDateTime,
        created_time: NaiveDateTime,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            task: task.into(),
            scheduled_time,
            created_time,
            is_active: true,
            is_completed: false,
            original_text: original_text.into(),
        }
    }

    /// Active and not yet fired.
    pub fn is_pending(&self) -> bool {
        self.is_active && !self.is_completed
    }

    /// Pending and at or past its scheduled time.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.is_pending() && self.scheduled_time <= now
    }

    /// Time left until the reminder fires. Zero once it is due, fired or cancelled.
    pub fn time_remaining(&self, now: NaiveDateTime) -> TimeDelta {
        if !self.is_pending() {
            return TimeDelta::zero();
        }
        (self.scheduled_time - now).max(TimeDelta::zero())
    }

    /// Countdown for display: `1h 05m`, `4m 12s`, `37s`, or `due`.
    pub fn format_remaining(&self, now: NaiveDateTime) -> String {
        format_countdown(self.time_remaining(now))
    }
}

pub fn format_countdown(remaining: TimeDelta) -> String {
    let secs = remaining.num_seconds();
    if secs <= 0 {
        return "due".to_string();
    }
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
