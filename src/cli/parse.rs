use anyhow::{Context, Result};
use serde_json::json;

use nudge::config::NudgeConfig;
use nudge::intent::Intent;
use nudge::reminder::{Clock, SystemClock};
use nudge::time;

/// Resolve `text` without scheduling anything and print the result as JSON.
pub async fn parse(config: &NudgeConfig, text: &str, fallback_only: bool) -> Result<()> {
    let resolver = super::build_resolver(&config.parser, fallback_only)?;
    let intent = resolver.resolve(text).await;

    let fire_time = match &intent {
        Intent::SetReminder(reminder) => {
            time::resolve(&reminder.time, SystemClock.now()).map(|at| at.to_string())
        }
        Intent::Other { .. } => None,
    };

    let output = json!({
        "text": text,
        "resolved": intent,
        "fire_time": fire_time,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to serialize parse result")?
    );
    Ok(())
}
