//! Typed errors surfaced by the scheduler and the intent resolver.
//!
//! Only [`SchedulerError::CapacityExceeded`] ever reaches a host. Parser failures and schema
//! violations are absorbed by the resolver's retry/fallback loop and exist as types so they can
//! be logged precisely.

use thiserror::Error;

/// Rejections returned by [`crate::reminder::ReminderScheduler`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Adding would exceed the configured number of pending reminders.
    #[error("reminder limit reached ({max} pending reminders)")]
    CapacityExceeded { max: usize },
}

/// Failure of one semantic-parse attempt.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The external parser could not be reached or returned an error status.
    #[error("semantic parser unavailable: {0}")]
    Unavailable(String),
    /// The parser answered, but the body was not a JSON object.
    #[error("malformed parser output: {0}")]
    Malformed(String),
}

/// A payload that decoded as JSON but broke one of the reminder payload rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown intent `{0}`")]
    UnknownIntent(String),
    #[error("confidence {0} outside [0.7, 1.0]")]
    ConfidenceOutOfRange(f64),
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("task must not be empty")]
    EmptyTask,
    #[error("amount {0} must be >= 0")]
    NegativeAmount(f64),
    #[error("amount {0} reaches further ahead than a relative reminder may")]
    AmountTooLarge(f64),
    #[error("unknown time unit `{0}`")]
    UnknownUnit(String),
    #[error("hour {0} outside 0..=23")]
    HourOutOfRange(i64),
    #[error("minute {0} outside 0..=59")]
    MinuteOutOfRange(i64),
}
