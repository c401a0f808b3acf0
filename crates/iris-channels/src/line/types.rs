//! LINE webhook and API payload types.

use serde::Deserialize;

/// Webhook request body: a batch of events.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub events: Vec<LineEvent>,
    pub destination: Option<String>,
}

/// One webhook event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub source: Option<LineSource>,
    pub message: Option<LineMessage>,
    pub postback: Option<LinePostback>,
    pub joined: Option<LineJoined>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
}

/// Who/where an event came from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
}

/// Message content of a message event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub id: Option<String>,
    pub text: Option<String>,
}

/// Postback content.
#[derive(Debug, Deserialize)]
pub struct LinePostback {
    pub data: String,
}

/// `memberJoined` payload.
#[derive(Debug, Deserialize)]
pub struct LineJoined {
    #[serde(default)]
    pub members: Vec<LineMember>,
}

/// One joined member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMember {
    #[serde(rename = "type")]
    pub member_type: String,
    pub user_id: Option<String>,
}

/// Response of the profile endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProfile {
    pub display_name: String,
}
