use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NudgeConfig {
    pub logging: LoggingConfig,
    pub reminders: ReminderConfig,
    pub parser: ParserConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

/// Limits and cadences of the reminder scheduler.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReminderConfig {
    /// Most reminders that may be pending (active and not yet fired) at once.
    pub max_reminders: usize,
    pub default_snooze_minutes: u32,
    /// A pending reminder closer than this counts as urgent.
    pub urgent_threshold_secs: u64,
    /// A pending reminder closer than this counts as critical.
    pub critical_threshold_secs: u64,
    /// Period of the monitor sweep.
    pub tick_interval_ms: u64,
    /// How often fired and cancelled reminders are dropped.
    pub cleanup_interval_secs: u64,
}

/// Chat-completion semantic parser settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ParserConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_attempts: usize,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            max_reminders: 20,
            default_snooze_minutes: 5,
            urgent_threshold_secs: 300,
            critical_threshold_secs: 60,
            tick_interval_ms: 1000,
            cleanup_interval_secs: 60,
        }
    }
}

impl ReminderConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.deepseek.com/v1".into(),
            model: "deepseek-chat".into(),
            api_key_env: "NUDGE_API_KEY".into(),
            max_attempts: 3,
            timeout_secs: 15,
            temperature: 0.05,
            max_tokens: 300,
        }
    }
}

/// Returns `~/.nudge/`, or `./.nudge/` when no home directory can be found.
pub fn default_nudge_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nudge")
}

/// Returns the default config file path: `~/.nudge/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nudge_dir().join("config.toml")
}

impl NudgeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NudgeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (NUDGE_LOG_LEVEL, NUDGE_MAX_REMINDERS,
    /// NUDGE_PARSER_ENDPOINT, NUDGE_PARSER_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NUDGE_LOG_LEVEL") {
            self.logging.log_level = val;
        }
        if let Ok(val) = std::env::var("NUDGE_MAX_REMINDERS") {
            match val.trim().parse() {
                Ok(max) => self.reminders.max_reminders = max,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid NUDGE_MAX_REMINDERS"),
            }
        }
        if let Ok(val) = std::env::var("NUDGE_PARSER_ENDPOINT") {
            self.parser.endpoint = val;
        }
        if let Ok(val) = std::env::var("NUDGE_PARSER_MODEL") {
            self.parser.model = val;
        }
    }
}
