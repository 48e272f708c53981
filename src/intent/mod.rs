//! Intent Resolver: free text to a structured reminder request.
//!
//! Resolution runs in two stages:
//!
//! 1. **Semantic parse**: an external [`SemanticParser`] is asked up to `max_attempts` times.
//!    Each answer is checked by [`schema::validate_payload`]; errors and invalid payloads count
//!    as failed attempts.
//! 2. **Rule-based fallback**: if stage 1 is disabled or produced nothing acceptable, the
//!    deterministic [`FallbackParser`] decides.
//!
//! Neither stage ever fails outward: text that is not a reminder request resolves to
//! [`Intent::Other`].

pub mod fallback;
pub mod llm;
pub mod schema;

pub use fallback::FallbackParser;
pub use llm::ChatCompletionParser;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ParseError;
use crate::time::TimeDescriptor;

/// Default number of semantic-parse attempts before falling back.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// An external capability that reads text and answers with a JSON payload.
///
/// Implementations only transport; validation happens in the resolver.
#[async_trait]
pub trait SemanticParser: Send + Sync {
    async fn try_parse(&self, text: &str) -> Result<serde_json::Value, ParseError>;
}

/// Which stage produced a reminder intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Primary,
    Fallback,
}

/// A validated request to set a reminder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderIntent {
    /// What to remind about, time phrases removed.
    pub task: String,
    pub time: TimeDescriptor,
    /// In `[0.7, 1.0]`.
    pub confidence: f64,
    pub source: IntentSource,
}

/// Outcome of resolving a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    SetReminder(ReminderIntent),
    /// Not a reminder request. Carries the text to relay or report.
    Other { message: String },
}

/// Two-stage resolver: bounded semantic parsing, then the rule-based parser.
#[derive(Clone)]
pub struct IntentResolver {
    primary: Option<Arc<dyn SemanticParser>>,
    max_attempts: usize,
    fallback: FallbackParser,
}

impl IntentResolver {
    pub fn new(primary: Option<Arc<dyn SemanticParser>>, max_attempts: usize) -> Self {
        Self {
            primary,
            max_attempts: max_attempts.max(1),
            fallback: FallbackParser::new(),
        }
    }

    /// A resolver that never calls out and always uses the rule-based parser.
    pub fn fallback_only() -> Self {
        Self::new(None, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Resolve `text` into an [`Intent`].
    pub async fn resolve(&self, text: &str) -> Intent {
        if let Some(intent) = self.try_primary(text).await {
            return intent;
        }
        let intent = self.fallback.parse(text);
        tracing::info!(
            reminder = matches!(intent, Intent::SetReminder(_)),
            "resolved with rule-based parser"
        );
        intent
    }

    /// Stage 1. `None` when there is no primary parser or every attempt failed.
    async fn try_primary(&self, text: &str) -> Option<Intent> {
        let parser = self.primary.as_ref()?;

        for attempt in 1..=self.max_attempts {
            match parser.try_parse(text).await {
                Ok(payload) => match schema::validate_payload(&payload, text) {
                    Ok(intent) => {
                        tracing::debug!(attempt, "semantic parse accepted");
                        return Some(intent);
                    }
                    Err(violation) => {
                        tracing::warn!(attempt, error = %violation, "semantic parse payload rejected");
                    }
                },
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "semantic parse attempt failed");
                }
            }
        }

        tracing::info!(
            attempts = self.max_attempts,
            "semantic parse exhausted, falling back"
        );
        None
    }
}
