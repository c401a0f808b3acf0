//! LINE Messaging API channel.
//!
//! Outbound only: replies and pushes via the Messaging API. Inbound events
//! arrive over the webhook served by the binary; the payload types and the
//! signature check live here so the webhook handler stays thin.
//! Docs: <https://developers.line.biz/en/reference/messaging-api/>

mod send;
pub mod signature;
pub mod template;
pub mod types;

#[cfg(test)]
mod tests;

use iris_core::config::LineConfig;

/// LINE channel using the Messaging API.
pub struct LineChannel {
    config: LineConfig,
    client: reqwest::Client,
    base_url: String,
}

impl LineChannel {
    /// Create a new LINE channel from config.
    pub fn new(config: LineConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            base_url: "https://api.line.me/v2/bot".to_string(),
        }
    }
}
