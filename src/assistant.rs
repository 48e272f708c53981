//! Host-side glue from an incoming message to a scheduled reminder and a spoken reply.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::SchedulerError;
use crate::intent::{Intent, IntentResolver, ReminderIntent};
use crate::notify::Notifier;
use crate::reminder::ReminderScheduler;
use crate::time;

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that. Please say it again.";

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Scheduled {
        id: String,
        task: String,
        at: NaiveDateTime,
        reply: String,
    },
    LimitReached {
        reply: String,
    },
    NotUnderstood {
        reply: String,
    },
    /// A non-reminder message from a named sender, passed on as spoken text.
    Relayed {
        reply: String,
    },
}

impl Outcome {
    /// The text that was spoken.
    pub fn reply(&self) -> &str {
        match self {
            Self::Scheduled { reply, .. }
            | Self::LimitReached { reply }
            | Self::NotUnderstood { reply }
            | Self::Relayed { reply } => reply,
        }
    }
}

pub struct Assistant {
    resolver: IntentResolver,
    scheduler: ReminderScheduler,
    notifier: Arc<dyn Notifier>,
}

impl Assistant {
    pub fn new(
        resolver: IntentResolver,
        scheduler: ReminderScheduler,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            scheduler,
            notifier,
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    /// Handle one message. `sender` names a family member when the text arrived from them
    /// rather than from the person being reminded.
    ///
    /// Resolution finishes before the scheduler is touched, and the reply is spoken through
    /// the notifier before returning.
    pub async fn handle_message(&self, text: &str, sender: Option<&str>) -> Outcome {
        let text = text.trim();
        let outcome = if text.is_empty() {
            Outcome::NotUnderstood {
                reply: NOT_UNDERSTOOD.to_string(),
            }
        } else {
            match self.resolver.resolve(text).await {
                Intent::SetReminder(intent) => self.schedule(intent, text),
                Intent::Other { message } => match sender.map(str::trim).filter(|s| !s.is_empty()) {
                    Some(sender) => Outcome::Relayed {
                        reply: format!("Message from {sender}: {message}"),
                    },
                    None => Outcome::NotUnderstood {
                        reply: NOT_UNDERSTOOD.to_string(),
                    },
                },
            }
        };

        tracing::debug!(?outcome, "message handled");
        self.notifier.on_voice(outcome.reply());
        outcome
    }

    fn schedule(&self, intent: ReminderIntent, text: &str) -> Outcome {
        let now = self.scheduler.now();
        let Some(at) = time::resolve(&intent.time, now) else {
            tracing::warn!(time = ?intent.time, "reminder time cannot be placed on the calendar");
            return Outcome::NotUnderstood {
                reply: NOT_UNDERSTOOD.to_string(),
            };
        };

        match self.scheduler.add(&intent.task, at, text) {
            Ok(id) => Outcome::Scheduled {
                reply: confirmation(&intent.task, at, now),
                id,
                task: intent.task,
                at,
            },
            Err(SchedulerError::CapacityExceeded { max }) => Outcome::LimitReached {
                reply: format!(
                    "Sorry, the reminder limit has been reached. You already have {max} reminders."
                ),
            },
        }
    }
}

/// "OK, I'll remind you tomorrow at 07:30 to walk the dog."
pub fn confirmation(task: &str, at: NaiveDateTime, now: NaiveDateTime) -> String {
    let day = match at.date().signed_duration_since(now.date()).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        2 => "the day after tomorrow".to_string(),
        _ => at.format("on %B %-d").to_string(),
    };
    format!("OK, I'll remind you {day} at {} to {task}.", at.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn confirmation_names_the_day() {
        let now = at(3, 14, 0);
        assert_eq!(
            confirmation("take medicine", at(3, 14, 30), now),
            "OK, I'll remind you today at 14:30 to take medicine."
        );
        assert_eq!(
            confirmation("walk the dog", at(4, 7, 30), now),
            "OK, I'll remind you tomorrow at 07:30 to walk the dog."
        );
        assert_eq!(
            confirmation("see the doctor", at(5, 9, 0), now),
            "OK, I'll remind you the day after tomorrow at 09:00 to see the doctor."
        );
        assert_eq!(
            confirmation("pay rent", at(10, 9, 0), now),
            "OK, I'll remind you on June 10 at 09:00 to pay rent."
        );
    }
}
