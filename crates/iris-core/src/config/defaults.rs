//! Default values for config fields.

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_name() -> String {
    "iris".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_completion_base() -> String {
    "https://api.openai.com/v1".to_string()
}

pub(super) fn default_model() -> String {
    "gpt-4o".to_string()
}

pub(super) fn default_temperature() -> f32 {
    0.5
}

pub(super) fn default_max_tokens() -> u32 {
    200
}

pub(super) fn default_timeout_secs() -> u64 {
    30
}

pub(super) fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

pub(super) fn default_fallback_reply() -> String {
    "抱歉，我現在無法回覆，請稍後再試。".to_string()
}

pub(super) fn default_news_base() -> String {
    "https://gnews.io/api/v4".to_string()
}

pub(super) fn default_news_lang() -> String {
    "zh".to_string()
}

pub(super) fn default_digest_time() -> String {
    "08:00".to_string()
}

pub(super) fn default_tick_secs() -> u64 {
    60
}

pub(super) fn default_max_turns() -> usize {
    20
}

pub(super) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(super) fn default_port() -> u16 {
    8000
}
