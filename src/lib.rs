//! Household reminder assistant: natural-language reminders with reliable, exactly-once firing.
//!
//! A message such as *"remind me at 3 to call Anna"* goes through three stages:
//!
//! 1. The [`intent`] resolver turns text into a task and a [`time::TimeDescriptor`], first by
//!    asking a chat-completion model (bounded retries, strict validation), then with a
//!    deterministic rule-based parser.
//! 2. The [`time`] engine resolves the descriptor to a concrete local time. An hour said without
//!    AM/PM resolves to whichever reading comes soonest.
//! 3. The [`reminder`] scheduler stores it, arms a timer, and runs a once-a-second monitor. A
//!    reminder fires exactly once, whichever path notices it first.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`error`]: Scheduler and parser error types
//! - [`time`]: Time descriptors and the resolution engine
//! - [`intent`]: Semantic parser, payload validation and the rule-based fallback
//! - [`reminder`]: Reminder record, scheduler, monitor and status summary
//! - [`notify`]: Voice and display callbacks
//! - [`assistant`]: Message handling from text to spoken confirmation

pub mod assistant;
pub mod config;
pub mod error;
pub mod intent;
pub mod notify;
pub mod reminder;
pub mod time;
