//! Scheduler Core.
//!
//! [`ReminderScheduler`] owns every reminder behind one mutex. Two paths can fire a reminder:
//!
//! - a **timer task**, spawned per reminder when it is added or snoozed, which sleeps until the
//!   scheduled time;
//! - the **monitor sweep**, which runs every tick and fires everything that is due.
//!
//! Both take the same lock and perform the same check-and-set on `is_completed`, so whichever
//! path gets there first fires and the other sees a completed reminder and does nothing.
//! Timers carry a generation number; a snooze re-arms with a new generation, which makes any
//! older timer for that reminder stale even if it wakes before its abort lands.
//!
//! Notifier callbacks are only ever made after the lock is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

use super::clock::Clock;
use super::monitor;
use super::status::StatusSummary;
use super::types::Reminder;
use crate::config::ReminderConfig;
use crate::error::SchedulerError;
use crate::notify::Notifier;

/// Which path fired a reminder. Only used for logging.
#[derive(Debug, Clone, Copy)]
enum FirePath {
    Timer,
    Monitor,
}

impl FirePath {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Monitor => "monitor",
        }
    }
}

struct ArmedTimer {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct State {
    reminders: Vec<Reminder>,
    timers: HashMap<String, ArmedTimer>,
    next_generation: u64,
}

impl State {
    fn pending_count(&self) -> usize {
        self.reminders.iter().filter(|r| r.is_pending()).count()
    }

    fn disarm(&mut self, id: &str) {
        if let Some(timer) = self.timers.remove(id) {
            timer.handle.abort();
        }
    }
}

pub(crate) struct Shared {
    state: Mutex<State>,
    config: ReminderConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    runtime: Handle,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

/// What a timer task should do after waking.
enum TimerOutcome {
    Fired,
    /// Superseded, cancelled, already fired, or removed.
    Stale,
    /// Woke before the scheduled time according to the clock; sleep this much longer.
    NotYet(Duration),
}

/// Handle to the reminder set. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct ReminderScheduler {
    shared: Arc<Shared>,
}

/// Non-owning handle held by background tasks so they stop once every scheduler is dropped.
pub(crate) struct WeakScheduler(Weak<Shared>);

impl WeakScheduler {
    pub(crate) fn upgrade(&self) -> Option<ReminderScheduler> {
        self.0.upgrade().map(|shared| ReminderScheduler { shared })
    }
}

impl ReminderScheduler {
    /// Create an empty scheduler. Timers are spawned on the Tokio runtime this is called from,
    /// so it must be called inside one.
    pub fn new(config: ReminderConfig, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_runtime(config, clock, notifier, Handle::current())
    }

    /// Create an empty scheduler whose timers run on `runtime`.
    pub fn with_runtime(
        config: ReminderConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                config,
                clock,
                notifier,
                runtime,
                monitor: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.shared.config
    }

    /// Current time according to the scheduler's clock.
    pub fn now(&self) -> NaiveDateTime {
        self.shared.clock.now()
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Arc::downgrade(&self.shared))
    }

    pub(crate) fn notify_display(&self) {
        self.shared.notifier.on_display_changed();
    }

    // State is consistent between statements, so a panic elsewhere never leaves it torn.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a reminder and arm its timer. Fails when the pending limit is reached.
    pub fn add(
        &self,
        task: &str,
        scheduled_time: NaiveDateTime,
        original_text: &str,
    ) -> Result<String, SchedulerError> {
        let now = self.now();
        let max = self.shared.config.max_reminders;

        let id = {
            let mut guard = self.lock();
            let state = &mut *guard;

            if state.pending_count() >= max {
                tracing::warn!(max, task = %task, "reminder limit reached, add rejected");
                return Err(SchedulerError::CapacityExceeded { max });
            }

            let reminder = Reminder::new(task, scheduled_time, now, original_text);
            let id = reminder.id.clone();
            state.reminders.push(reminder);
            self.arm(state, &id, scheduled_time, now);
            id
        };

        tracing::info!(id = %id, task = %task, at = %scheduled_time, "reminder added");
        self.notify_display();
        Ok(id)
    }

    /// Cancel a pending reminder. `false` if it is unknown, already cancelled, or already fired.
    pub fn cancel(&self, id: &str) -> bool {
        {
            let mut guard = self.lock();
            let state = &mut *guard;

            let Some(reminder) = state.reminders.iter_mut().find(|r| r.id == id) else {
                tracing::debug!(id = %id, "cancel: no such reminder");
                return false;
            };
            if reminder.is_completed {
                tracing::debug!(id = %id, "cancel: reminder already fired, ignoring");
                return false;
            }
            if !reminder.is_active {
                return false;
            }
            reminder.is_active = false;
            state.disarm(id);
        }

        tracing::info!(id = %id, "reminder cancelled");
        self.notify_display();
        true
    }

    /// Push a reminder `minutes` (default from config) past now and re-arm it.
    ///
    /// A fired reminder comes back as pending, provided the pending limit allows it. Cancelled
    /// and unknown reminders return `false`.
    pub fn snooze(&self, id: &str, minutes: Option<u32>) -> bool {
        let minutes = minutes.unwrap_or(self.shared.config.default_snooze_minutes);
        let now = self.now();
        let new_time = now + TimeDelta::minutes(i64::from(minutes));
        let max = self.shared.config.max_reminders;

        {
            let mut guard = self.lock();
            let state = &mut *guard;
            let pending = state.pending_count();

            let Some(reminder) = state.reminders.iter_mut().find(|r| r.id == id) else {
                tracing::debug!(id = %id, "snooze: no such reminder");
                return false;
            };
            if !reminder.is_active {
                return false;
            }
            if reminder.is_completed && pending >= max {
                tracing::warn!(id = %id, max, "snooze would exceed reminder limit");
                return false;
            }
            reminder.scheduled_time = new_time;
            reminder.is_completed = false;
            self.arm(state, id, new_time, now);
        }

        tracing::info!(id = %id, minutes, at = %new_time, "reminder snoozed");
        self.notify_display();
        true
    }

    /// Disarm every timer and drop every reminder. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let removed = {
            let mut guard = self.lock();
            let state = &mut *guard;
            for (_, timer) in state.timers.drain() {
                timer.handle.abort();
            }
            let removed = state.reminders.len();
            state.reminders.clear();
            removed
        };

        tracing::info!(removed, "all reminders cleared");
        let message = if removed == 0 {
            "There are no reminders to clear.".to_string()
        } else {
            format!("Cleared {removed} reminder(s).")
        };
        self.shared.notifier.on_voice(&message);
        self.notify_display();
        removed
    }

    /// Pending reminders, soonest first.
    pub fn get_active(&self) -> Vec<Reminder> {
        let mut active: Vec<Reminder> = self
            .lock()
            .reminders
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.scheduled_time
                .cmp(&b.scheduled_time)
                .then_with(|| a.created_time.cmp(&b.created_time))
        });
        active
    }

    /// The pending reminder that fires next.
    pub fn get_current(&self) -> Option<Reminder> {
        self.get_active().into_iter().next()
    }

    /// A copy of one reminder, whatever its state.
    pub fn get(&self, id: &str) -> Option<Reminder> {
        self.lock().reminders.iter().find(|r| r.id == id).cloned()
    }

    /// Number of reminders held, including fired and cancelled ones not yet reaped.
    pub fn len(&self) -> usize {
        self.lock().reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts and countdowns for display.
    pub fn status_summary(&self) -> StatusSummary {
        let now = self.now();
        let reminders = self.lock().reminders.clone();
        StatusSummary::build(&reminders, now, &self.shared.config)
    }

    /// Fire every due reminder. Returns how many fired.
    ///
    /// All of them are announced in a single voice message.
    pub fn sweep(&self) -> usize {
        let now = self.now();

        let fired: Vec<(String, String)> = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let mut fired = Vec::new();
            for reminder in state.reminders.iter_mut().filter(|r| r.is_due(now)) {
                reminder.is_completed = true;
                fired.push((reminder.id.clone(), reminder.task.clone()));
            }
            for (id, _) in &fired {
                state.disarm(id);
            }
            fired
        };

        if fired.is_empty() {
            return 0;
        }

        for (id, task) in &fired {
            log_fired(id, task, FirePath::Monitor);
        }
        let tasks: Vec<&str> = fired.iter().map(|(_, task)| task.as_str()).collect();
        self.shared.notifier.on_voice(&fired_message(&tasks));
        self.notify_display();
        fired.len()
    }

    /// Drop reminders that have fired or been cancelled. Returns how many were dropped.
    pub fn reap(&self) -> usize {
        let reaped = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let before = state.reminders.len();
            let mut dropped = Vec::new();
            state.reminders.retain(|r| {
                let keep = r.is_pending();
                if !keep {
                    dropped.push(r.id.clone());
                }
                keep
            });
            for id in &dropped {
                state.disarm(id);
            }
            before - state.reminders.len()
        };

        if reaped > 0 {
            tracing::debug!(reaped, "reaped finished reminders");
        }
        reaped
    }

    /// Start the periodic monitor. Does nothing if it is already running.
    pub fn start_monitor(&self) {
        let mut slot = self
            .shared
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let config = &self.shared.config;
        let task = monitor::run(
            self.downgrade(),
            config.tick_interval(),
            config.cleanup_interval(),
        );
        *slot = Some(self.shared.runtime.spawn(task));
        tracing::debug!(tick_ms = config.tick_interval_ms, "reminder monitor started");
    }

    /// Stop the monitor and disarm every timer. Reminders stay in place.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .shared
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }

        let mut guard = self.lock();
        for (_, timer) in guard.timers.drain() {
            timer.handle.abort();
        }
        tracing::debug!("reminder scheduler shut down");
    }

    /// Number of armed timers. Exposed for tests and diagnostics.
    pub fn armed_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Spawn a timer for `id` and register it, replacing any earlier one. Caller holds the lock.
    fn arm(&self, state: &mut State, id: &str, at: NaiveDateTime, now: NaiveDateTime) {
        state.next_generation += 1;
        let generation = state.next_generation;
        let delay = (at - now).to_std().unwrap_or(Duration::ZERO);

        let task = run_timer(self.downgrade(), id.to_string(), generation, delay);
        let handle = self.shared.runtime.spawn(task).abort_handle();

        if let Some(previous) = state
            .timers
            .insert(id.to_string(), ArmedTimer { generation, handle })
        {
            previous.handle.abort();
        }
    }

    /// Timer path of the fire check-and-set.
    fn fire_from_timer(&self, id: &str, generation: u64) -> TimerOutcome {
        let now = self.now();

        let task = {
            let mut guard = self.lock();
            let state = &mut *guard;

            match state.timers.get(id) {
                Some(timer) if timer.generation == generation => {}
                _ => return TimerOutcome::Stale,
            }

            let Some(reminder) = state.reminders.iter_mut().find(|r| r.id == id) else {
                state.timers.remove(id);
                return TimerOutcome::Stale;
            };
            if !reminder.is_pending() {
                state.timers.remove(id);
                return TimerOutcome::Stale;
            }
            if reminder.scheduled_time > now {
                let rest = (reminder.scheduled_time - now)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                return TimerOutcome::NotYet(rest);
            }

            reminder.is_completed = true;
            let task = reminder.task.clone();
            state.timers.remove(id);
            task
        };

        log_fired(id, &task, FirePath::Timer);
        self.shared.notifier.on_voice(&fired_message(&[task.as_str()]));
        self.notify_display();
        TimerOutcome::Fired
    }
}

async fn run_timer(scheduler: WeakScheduler, id: String, generation: u64, delay: Duration) {
    let mut wait = delay;
    loop {
        tokio::time::sleep(wait).await;
        let Some(scheduler) = scheduler.upgrade() else {
            return;
        };
        match scheduler.fire_from_timer(&id, generation) {
            TimerOutcome::NotYet(rest) => wait = rest,
            TimerOutcome::Fired | TimerOutcome::Stale => return,
        }
    }
}

fn log_fired(id: &str, task: &str, path: FirePath) {
    tracing::info!(id = %id, task = %task, path = path.as_str(), "reminder fired");
}

/// Voice text for reminders that fired together.
fn fired_message(tasks: &[&str]) -> String {
    match tasks {
        [task] => format!("Reminder: {task}"),
        _ => format!("{} reminders are due: {}", tasks.len(), tasks.join(", ")),
    }
}
