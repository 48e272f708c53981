pub mod listen;
pub mod parse;

use std::sync::Arc;

use anyhow::Result;

use nudge::config::ParserConfig;
use nudge::intent::{ChatCompletionParser, IntentResolver, SemanticParser};

/// Build the intent resolver from config. Without an API key it runs fallback-only.
pub fn build_resolver(config: &ParserConfig, fallback_only: bool) -> Result<IntentResolver> {
    if fallback_only {
        return Ok(IntentResolver::fallback_only());
    }
    let primary = ChatCompletionParser::from_config(config)?
        .map(|parser| Arc::new(parser) as Arc<dyn SemanticParser>);
    Ok(IntentResolver::new(primary, config.max_attempts))
}
