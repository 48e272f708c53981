//! Chat-completion semantic parser.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. The model is shown the JSON
//! Schema of [`ReminderPayload`](super::schema::ReminderPayload) and asked for a single JSON
//! object; the reply is cleaned of markdown fences and surrounding prose before decoding.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::schema::payload_schema_json;
use super::SemanticParser;
use crate::config::ParserConfig;
use crate::error::ParseError;

const SYSTEM_PROMPT: &str = "You are a precise voice assistant that reads reminder requests \
from elderly users. Always answer with a single JSON object and nothing else.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// [`SemanticParser`] backed by a chat-completion HTTP API.
pub struct ChatCompletionParser {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionParser {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature: 0.05,
            max_tokens: 300,
        })
    }

    /// Build from config. `Ok(None)` when parsing is disabled or the API key variable is unset.
    pub fn from_config(config: &ParserConfig) -> anyhow::Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::info!(
                    var = %config.api_key_env,
                    "no API key set, semantic parser disabled"
                );
                return Ok(None);
            }
        };

        let parser = Self::new(
            &config.endpoint,
            &config.model,
            api_key.trim(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_sampling(config.temperature, config.max_tokens);
        Ok(Some(parser))
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn build_prompt(text: &str) -> String {
        format!(
            r#"Decide whether the text below asks to be reminded of something.

Text: "{text}"

Answer with one JSON object matching this schema:
{schema}

Rules:
- "intent" is "set_reminder" or "other".
- "in 30 minutes" -> amount 30, unit "minute". "in half an hour" -> amount 0.5, unit "hour".
- A clock time uses unit "today_at", "tomorrow_at" or "day_after_tomorrow_at" with "hour" and "minute".
- Convert to 24h only when morning/afternoon/evening was said ("3pm" -> hour 15).
- An hour 1-12 said without morning/afternoon/evening keeps its number and sets "bare_hour": true.
- "task" is the thing to do, with every time expression removed.
- "confidence" is between 0.7 and 1.0.
- For anything that is not a reminder request use intent "other" and copy the text into "message"."#,
            schema = payload_schema_json(),
        )
    }

    async fn complete(&self, prompt: &str) -> Result<String, ParseError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ParseError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParseError::Unavailable(format!("API returned status {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ParseError::Malformed(format!("unexpected response body: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ParseError::Malformed("response has no content".to_string()))
    }
}

#[async_trait]
impl SemanticParser for ChatCompletionParser {
    async fn try_parse(&self, text: &str) -> Result<serde_json::Value, ParseError> {
        let prompt = Self::build_prompt(text);
        let reply = self.complete(&prompt).await?;
        tracing::debug!(reply = %reply, "chat completion reply");

        let json = extract_json_object(&reply)
            .ok_or_else(|| ParseError::Malformed("no JSON object in reply".to_string()))?;
        serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))
    }
}

/// Slice the JSON object out of a model reply: drops ```json fences and any prose around the
/// outermost braces.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let mut body = reply.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    body = body.trim_end().trim_end_matches("```");

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| body[start..=end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_json() {
        let reply = "```json\n{\"intent\": \"other\", \"confidence\": 0.9}\n```";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"intent\": \"other\", \"confidence\": 0.9}")
        );
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let reply = "Sure! Here it is: {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn no_object_yields_none() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn prompt_carries_text_and_schema() {
        let prompt = ChatCompletionParser::build_prompt("remind me at 3 to call mom");
        assert!(prompt.contains("remind me at 3 to call mom"));
        assert!(prompt.contains("bare_hour"));
        assert!(prompt.contains("day_after_tomorrow_at"));
    }

    #[test]
    fn disabled_config_builds_nothing() {
        let config = ParserConfig {
            enabled: false,
            ..ParserConfig::default()
        };
        assert!(ChatCompletionParser::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let parser = ChatCompletionParser::new(
            "http://localhost:8080/v1/",
            "m",
            "k",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(parser.endpoint, "http://localhost:8080/v1");
    }
}
