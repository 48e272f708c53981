//! Scheduler Core: the reminder record, the scheduler that owns it, and the monitor loop.

pub mod clock;
pub mod monitor;
pub mod scheduler;
pub mod status;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use monitor::DisplayThrottle;
pub use scheduler::ReminderScheduler;
pub use status::{CurrentReminder, ReminderView, StatusSummary};
pub use types::{format_countdown, Reminder};
