//! Reminder payload contract and validation.
//!
//! The semantic parser answers with a JSON object. [`validate_payload`] checks it field by field
//! and converts an acceptable payload into an [`Intent`]; anything else is a
//! [`SchemaViolation`], which the resolver treats as a failed attempt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Intent, IntentSource, ReminderIntent};
use crate::error::SchemaViolation;
use crate::time::{relative_secs, DayOffset, RelativeUnit, TimeDescriptor};

/// Lowest confidence a payload may carry.
pub const MIN_CONFIDENCE: f64 = 0.7;
/// Highest confidence a payload may carry.
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Shape the semantic parser is asked to produce. Used to describe the contract in the prompt;
/// validation itself works on the raw JSON so each rule can be reported separately.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReminderPayload {
    #[schemars(description = "'set_reminder' when the text asks to be reminded of something, otherwise 'other'")]
    pub intent: String,

    #[schemars(description = "What to remind about, with every time expression removed")]
    pub task: Option<String>,

    #[schemars(
        description = "For minute/hour/day: how many units from now (may be 0.5). For *_at units: the hour"
    )]
    pub amount: Option<f64>,

    #[schemars(
        description = "One of: minute, hour, day, today_at, tomorrow_at, day_after_tomorrow_at"
    )]
    pub unit: Option<String>,

    #[schemars(description = "Required for *_at units: hour 0-23, converted to 24h when morning/afternoon was said")]
    pub hour: Option<u32>,

    #[schemars(description = "Required for *_at units: minute 0-59")]
    pub minute: Option<u32>,

    #[schemars(
        description = "true when the hour was said as 1-12 with no morning/afternoon/evening word"
    )]
    pub bare_hour: Option<bool>,

    #[schemars(description = "For 'other': the original text")]
    pub message: Option<String>,

    #[schemars(description = "How certain the reading is, 0.7-1.0")]
    pub confidence: f64,
}

/// The time unit named by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadUnit {
    Relative(RelativeUnit),
    At(DayOffset),
}

/// Map a unit label to its meaning. Accepts the English labels and the Chinese labels older
/// prompts used.
fn parse_unit(label: &str) -> Option<PayloadUnit> {
    let unit = match label.trim() {
        "minute" | "minutes" | "分钟" | "分" => PayloadUnit::Relative(RelativeUnit::Minute),
        "hour" | "hours" | "小时" | "时" => PayloadUnit::Relative(RelativeUnit::Hour),
        "day" | "days" | "天" | "日" => PayloadUnit::Relative(RelativeUnit::Day),
        "today_at" | "今天具体时间" => PayloadUnit::At(DayOffset::Today),
        "tomorrow_at" | "明天具体时间" => PayloadUnit::At(DayOffset::Tomorrow),
        "day_after_tomorrow_at" | "后天具体时间" => PayloadUnit::At(DayOffset::DayAfterTomorrow),
        _ => return None,
    };
    Some(unit)
}

/// First present field among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| obj.get(*n).filter(|v| !v.is_null()))
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    name: &'static str,
    aliases: &[&str],
) -> Result<&'a Value, SchemaViolation> {
    let mut names = vec![name];
    names.extend_from_slice(aliases);
    field(obj, &names).ok_or(SchemaViolation::MissingField(name))
}

/// Validate a parser payload for `original_text`.
pub fn validate_payload(payload: &Value, original_text: &str) -> Result<Intent, SchemaViolation> {
    let obj = payload.as_object().ok_or(SchemaViolation::NotAnObject)?;

    let intent = require(obj, "intent", &[])?
        .as_str()
        .ok_or(SchemaViolation::WrongType("intent"))?;
    let confidence = require(obj, "confidence", &[])?
        .as_f64()
        .ok_or(SchemaViolation::WrongType("confidence"))?;
    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
        return Err(SchemaViolation::ConfidenceOutOfRange(confidence));
    }

    match intent {
        "other" => {
            let message = field(obj, &["message"])
                .and_then(Value::as_str)
                .unwrap_or(original_text)
                .to_string();
            Ok(Intent::Other { message })
        }
        "set_reminder" => validate_reminder(obj, confidence).map(Intent::SetReminder),
        other => Err(SchemaViolation::UnknownIntent(other.to_string())),
    }
}

fn validate_reminder(
    obj: &Map<String, Value>,
    confidence: f64,
) -> Result<ReminderIntent, SchemaViolation> {
    let task = require(obj, "task", &[])?
        .as_str()
        .ok_or(SchemaViolation::WrongType("task"))?
        .trim();
    if task.is_empty() {
        return Err(SchemaViolation::EmptyTask);
    }

    let amount = require(obj, "amount", &["time_value"])?
        .as_f64()
        .ok_or(SchemaViolation::WrongType("amount"))?;
    if amount < 0.0 {
        return Err(SchemaViolation::NegativeAmount(amount));
    }

    let unit_label = require(obj, "unit", &["time_unit"])?
        .as_str()
        .ok_or(SchemaViolation::WrongType("unit"))?;
    let unit =
        parse_unit(unit_label).ok_or_else(|| SchemaViolation::UnknownUnit(unit_label.to_string()))?;

    let time = match unit {
        PayloadUnit::Relative(unit) => {
            if relative_secs(amount, unit).is_none() {
                return Err(SchemaViolation::AmountTooLarge(amount));
            }
            TimeDescriptor::relative(amount, unit)
        }
        PayloadUnit::At(day) => {
            let hour = require(obj, "hour", &[])?
                .as_i64()
                .ok_or(SchemaViolation::WrongType("hour"))?;
            if !(0..=23).contains(&hour) {
                return Err(SchemaViolation::HourOutOfRange(hour));
            }
            let minute = require(obj, "minute", &[])?
                .as_i64()
                .ok_or(SchemaViolation::WrongType("minute"))?;
            if !(0..=59).contains(&minute) {
                return Err(SchemaViolation::MinuteOutOfRange(minute));
            }
            let hour = hour as u32;
            let bare_hour = match field(obj, &["bare_hour"]) {
                Some(v) => v.as_bool().ok_or(SchemaViolation::WrongType("bare_hour"))?,
                None => day == DayOffset::Today && (1..=12).contains(&hour),
            };
            TimeDescriptor::at(day, hour, minute as u32, bare_hour && (1..=12).contains(&hour))
        }
    };

    Ok(ReminderIntent {
        task: task.to_string(),
        time,
        confidence,
        source: IntentSource::Primary,
    })
}

/// JSON Schema of [`ReminderPayload`], pretty-printed for embedding in a prompt.
pub fn payload_schema_json() -> String {
    let schema = schemars::schema_for!(ReminderPayload);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
