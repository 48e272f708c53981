//! Status summary: counts by urgency and the next reminder due.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::types::{format_countdown, Reminder};
use crate::config::ReminderConfig;

/// Snapshot of the reminder set for a status display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    /// Every reminder held, fired and cancelled ones included until reaped.
    pub total: usize,
    /// Pending reminders.
    pub active: usize,
    /// Pending, due within the urgent threshold but not within the critical one.
    pub urgent: usize,
    /// Pending, due within the critical threshold.
    pub critical: usize,
    pub current: Option<CurrentReminder>,
    /// Pending reminders, soonest first.
    pub reminders: Vec<ReminderView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReminder {
    pub id: String,
    pub task: String,
    pub time_remaining: String,
    /// `HH:MM`
    pub scheduled_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderView {
    pub id: String,
    pub task: String,
    /// `HH:MM`
    pub scheduled_time: String,
    pub time_remaining: String,
    pub remaining_secs: i64,
    pub is_urgent: bool,
    pub is_critical: bool,
}

impl StatusSummary {
    pub fn build(reminders: &[Reminder], now: NaiveDateTime, config: &ReminderConfig) -> Self {
        let urgent_secs = config.urgent_threshold_secs as i64;
        let critical_secs = config.critical_threshold_secs as i64;

        let mut pending: Vec<&Reminder> = reminders.iter().filter(|r| r.is_pending()).collect();
        pending.sort_by_key(|r| (r.scheduled_time, r.created_time));

        let views: Vec<ReminderView> = pending
            .iter()
            .map(|r| {
                let remaining = r.time_remaining(now);
                let secs = remaining.num_seconds();
                let is_critical = secs <= critical_secs;
                ReminderView {
                    id: r.id.clone(),
                    task: r.task.clone(),
                    scheduled_time: r.scheduled_time.format("%H:%M").to_string(),
                    time_remaining: format_countdown(remaining),
                    remaining_secs: secs,
                    is_urgent: !is_critical && secs <= urgent_secs,
                    is_critical,
                }
            })
            .collect();

        let current = views.first().map(|v| CurrentReminder {
            id: v.id.clone(),
            task: v.task.clone(),
            time_remaining: v.time_remaining.clone(),
            scheduled_time: v.scheduled_time.clone(),
        });

        Self {
            total: reminders.len(),
            active: views.len(),
            urgent: views.iter().filter(|v| v.is_urgent).count(),
            critical: views.iter().filter(|v| v.is_critical).count(),
            current,
            reminders: views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn due_in(task: &str, secs: i64) -> Reminder {
        Reminder::new(task, now() + TimeDelta::seconds(secs), now(), task)
    }

    #[test]
    fn empty_set() {
        let s = StatusSummary::build(&[], now(), &ReminderConfig::default());
        assert_eq!(s.total, 0);
        assert_eq!(s.active, 0);
        assert!(s.current.is_none());
    }

    #[test]
    fn urgent_and_critical_are_exclusive() {
        let reminders = vec![
            due_in("far", 3600),
            due_in("urgent", 240),
            due_in("edge-urgent", 300),
            due_in("critical", 30),
            due_in("edge-critical", 60),
        ];
        let s = StatusSummary::build(&reminders, now(), &ReminderConfig::default());
        assert_eq!(s.active, 5);
        assert_eq!(s.urgent, 2);
        assert_eq!(s.critical, 2);

        let critical: Vec<&str> = s
            .reminders
            .iter()
            .filter(|v| v.is_critical)
            .map(|v| v.task.as_str())
            .collect();
        assert_eq!(critical, ["critical", "edge-critical"]);
        assert!(s.reminders.iter().all(|v| !(v.is_urgent && v.is_critical)));
    }

    #[test]
    fn current_is_the_soonest_pending() {
        let mut fired = due_in("fired", 10);
        fired.is_completed = true;
        let reminders = vec![due_in("later", 7200), fired, due_in("sooner", 3900)];

        let s = StatusSummary::build(&reminders, now(), &ReminderConfig::default());
        assert_eq!(s.total, 3);
        assert_eq!(s.active, 2);
        let current = s.current.unwrap();
        assert_eq!(current.task, "sooner");
        assert_eq!(current.scheduled_time, "15:05");
        assert_eq!(current.time_remaining, "1h 05m");
    }
}
