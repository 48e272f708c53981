mod helpers;

use std::sync::Arc;

use helpers::*;
use nudge::error::ParseError;
use nudge::intent::{Intent, IntentResolver, IntentSource, SemanticParser};
use nudge::time::{DayOffset, RelativeUnit, TimeDescriptor};
use serde_json::json;

fn resolver_with(parser: &Arc<ScriptedParser>) -> IntentResolver {
    IntentResolver::new(Some(parser.clone() as Arc<dyn SemanticParser>), 3)
}

fn reminder_payload() -> serde_json::Value {
    json!({
        "intent": "set_reminder",
        "task": "call Anna",
        "amount": 3,
        "unit": "today_at",
        "hour": 3,
        "minute": 0,
        "bare_hour": true,
        "confidence": 0.92
    })
}

#[tokio::test]
async fn valid_primary_payload_is_used() {
    let parser = ScriptedParser::new(vec![Ok(reminder_payload())]);
    let intent = resolver_with(&parser).resolve("at 3 call Anna").await;

    let Intent::SetReminder(r) = intent else {
        panic!("expected a reminder, got {intent:?}");
    };
    assert_eq!(r.task, "call Anna");
    assert_eq!(r.time, TimeDescriptor::at(DayOffset::Today, 3, 0, true));
    assert_eq!(r.confidence, 0.92);
    assert_eq!(r.source, IntentSource::Primary);
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_retried() {
    let parser = ScriptedParser::new(vec![
        Ok(json!({"intent": "set_reminder", "confidence": 0.4})),
        Err(ParseError::Malformed("not json".into())),
        Ok(reminder_payload()),
    ]);
    let intent = resolver_with(&parser).resolve("at 3 call Anna").await;

    assert!(matches!(
        intent,
        Intent::SetReminder(ref r) if r.source == IntentSource::Primary
    ));
    assert_eq!(parser.calls(), 3);
}

#[tokio::test]
async fn three_failures_fall_back_to_rules() {
    let parser = ScriptedParser::unavailable();
    let intent = resolver_with(&parser)
        .resolve("remind me in 30 minutes to take medicine")
        .await;

    let Intent::SetReminder(r) = intent else {
        panic!("expected a reminder, got {intent:?}");
    };
    assert_eq!(parser.calls(), 3);
    assert_eq!(r.source, IntentSource::Fallback);
    assert_eq!(r.confidence, 0.75);
    assert_eq!(r.task, "take medicine");
    assert_eq!(r.time, TimeDescriptor::relative(30.0, RelativeUnit::Minute));
}

#[tokio::test]
async fn fourth_reply_is_never_requested() {
    let bad = || Ok(json!({"intent": "set_reminder", "task": "", "amount": 1, "unit": "hour", "confidence": 0.9}));
    let parser = ScriptedParser::new(vec![bad(), bad(), bad(), Ok(reminder_payload())]);
    let intent = resolver_with(&parser).resolve("what a lovely day").await;

    assert_eq!(parser.calls(), 3);
    assert_eq!(
        intent,
        Intent::Other {
            message: "what a lovely day".into()
        }
    );
}

#[tokio::test]
async fn primary_other_is_accepted() {
    let parser = ScriptedParser::new(vec![Ok(json!({
        "intent": "other",
        "message": "dinner is ready",
        "confidence": 0.95
    }))]);
    let intent = resolver_with(&parser).resolve("dinner is ready").await;

    assert_eq!(
        intent,
        Intent::Other {
            message: "dinner is ready".into()
        }
    );
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn fallback_only_resolver_never_calls_out() {
    let resolver = IntentResolver::fallback_only();
    assert!(!resolver.has_primary());

    let intent = resolver.resolve("明天下午3点提醒我去医院").await;
    let Intent::SetReminder(r) = intent else {
        panic!("expected a reminder, got {intent:?}");
    };
    assert_eq!(r.time, TimeDescriptor::at(DayOffset::Tomorrow, 15, 0, false));
    assert_eq!(r.source, IntentSource::Fallback);
}
