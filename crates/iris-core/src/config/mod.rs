mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::IrisError;
use defaults::*;

/// Top-level iris configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub iris: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Completion service settings.
///
/// Sampling parameters and the fallback reply live here so the request
/// logic carries no inline constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_base")]
    pub base_url: String,
    /// Resolved from `OPENAI_API_KEY` when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// System turn seeded into every new conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Reply substituted when the completion service fails. The user always
    /// gets some reply, never a raw error.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// LINE Messaging API settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineConfig {
    /// Resolved from `LINE_CHANNEL_ACCESS_TOKEN` when empty.
    #[serde(default)]
    pub channel_access_token: String,
    /// Resolved from `LINE_CHANNEL_SECRET` when empty.
    #[serde(default)]
    pub channel_secret: String,
}

/// News feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_news_base")]
    pub base_url: String,
    /// Resolved from `GNEWS_API_KEY` when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_news_lang")]
    pub language: String,
    /// Daily digest broadcast time, "HH:MM" local.
    #[serde(default = "default_digest_time")]
    pub digest_time: String,
    /// Optional category for the daily digest.
    #[serde(default)]
    pub digest_category: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_news_base(),
            api_key: String::new(),
            language: default_news_lang(),
            digest_time: default_digest_time(),
            digest_category: None,
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Tick period in seconds. Also the scheduling resolution floor:
    /// firing times finer than one tick are rounded at creation.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: default_tick_secs(),
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Retention bound: most recent turns kept per user beyond the system
    /// turn. Rounded down to an even count so trimming never splits an
    /// exchange.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Fill credentials from the process environment.
    ///
    /// Fails when a required credential is absent from both the config file
    /// and the environment — startup must bail rather than run degraded.
    pub fn resolve_credentials(&mut self) -> Result<(), IrisError> {
        fill_from_env(
            &mut self.line.channel_access_token,
            "LINE_CHANNEL_ACCESS_TOKEN",
        )?;
        fill_from_env(&mut self.line.channel_secret, "LINE_CHANNEL_SECRET")?;
        fill_from_env(&mut self.completion.api_key, "OPENAI_API_KEY")?;
        if self.news.enabled {
            fill_from_env(&mut self.news.api_key, "GNEWS_API_KEY")?;
        }
        Ok(())
    }
}

fn fill_from_env(slot: &mut String, var: &str) -> Result<(), IrisError> {
    if slot.is_empty() {
        *slot = std::env::var(var).map_err(|_| {
            IrisError::Config(format!("missing credential: set {var} or the config field"))
        })?;
    }
    Ok(())
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, IrisError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| IrisError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| IrisError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
