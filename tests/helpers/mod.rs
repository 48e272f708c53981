#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use nudge::config::ReminderConfig;
use nudge::error::ParseError;
use nudge::intent::SemanticParser;
use nudge::notify::Notifier;
use nudge::reminder::{Clock, ReminderScheduler};

/// 2024-06-03 (a Monday) at `hour:minute`.
pub fn monday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn at(now: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// Records every callback.
#[derive(Default)]
pub struct RecordingNotifier {
    voices: Mutex<Vec<String>>,
    displays: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }

    pub fn display_count(&self) -> usize {
        self.displays.load(Ordering::SeqCst)
    }

    /// How many voice messages mention `task`.
    pub fn mentions(&self, task: &str) -> usize {
        self.voices
            .lock()
            .unwrap()
            .iter()
            .map(|v| v.matches(task).count())
            .sum()
    }
}

impl Notifier for RecordingNotifier {
    fn on_voice(&self, message: &str) {
        self.voices.lock().unwrap().push(message.to_string());
    }

    fn on_display_changed(&self) {
        self.displays.fetch_add(1, Ordering::SeqCst);
    }
}

/// Semantic parser that plays back canned replies, then reports itself unavailable.
pub struct ScriptedParser {
    replies: Mutex<VecDeque<Result<serde_json::Value, ParseError>>>,
    calls: AtomicUsize,
}

impl ScriptedParser {
    pub fn new(replies: Vec<Result<serde_json::Value, ParseError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    /// A parser that is always down.
    pub fn unavailable() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticParser for ScriptedParser {
    async fn try_parse(&self, _text: &str) -> Result<serde_json::Value, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ParseError::Unavailable("connection refused".into())))
    }
}

pub fn config_with_max(max_reminders: usize) -> ReminderConfig {
    ReminderConfig {
        max_reminders,
        ..ReminderConfig::default()
    }
}

/// A scheduler on the current runtime with a manual clock and a recording notifier.
pub fn test_scheduler(
    config: ReminderConfig,
    now: NaiveDateTime,
) -> (ReminderScheduler, Arc<ManualClock>, Arc<RecordingNotifier>) {
    let clock = ManualClock::at(now);
    let notifier = RecordingNotifier::new();
    let scheduler = ReminderScheduler::new(config, clock.clone(), notifier.clone());
    (scheduler, clock, notifier)
}

/// Poll `check` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
