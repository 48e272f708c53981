//! Notification Dispatch contracts.
//!
//! The scheduler never talks to a speaker or a screen directly. It calls a [`Notifier`]
//! after releasing its lock, and the host decides what voice and display mean.

/// Receiver of scheduler output.
pub trait Notifier: Send + Sync {
    /// Something should be said: a reminder fired, or an administrative action completed.
    fn on_voice(&self, message: &str);

    /// The list or a countdown changed. Pull fresh state with
    /// [`ReminderScheduler::get_active`](crate::reminder::ReminderScheduler::get_active).
    fn on_display_changed(&self);
}

/// Writes voice output to the log and ignores display updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_voice(&self, message: &str) {
        tracing::info!(message = %message, "voice");
    }

    fn on_display_changed(&self) {
        tracing::trace!("display changed");
    }
}
