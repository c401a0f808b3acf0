use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound event handed over by the webhook collaborator after
/// transport authenticity has been verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub id: Uuid,
    pub kind: EventKind,
    /// Platform-specific user ID.
    pub user_id: String,
    /// Group the event originated from, when not a 1:1 chat.
    pub group_id: Option<String>,
    /// One-shot token for replying to this event.
    pub reply_token: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Event kinds the gateway reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// Plain text message.
    Text { text: String },
    /// A member joined a group the bot is in.
    MemberJoined,
    /// Generic postback. Logged only, no state effect.
    Postback { data: String },
}

/// Where an outgoing message is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryTarget {
    /// One-shot reply bound to an inbound event's reply token.
    Reply(String),
    /// Push to a user id, independent of any inbound event.
    Push(String),
}

/// Message content kinds the delivery collaborator accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Text(String),
    Carousel {
        /// Notification-bar text shown where templates can't render.
        alt_text: String,
        columns: Vec<CarouselColumn>,
    },
}

/// One entry of a carousel template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselColumn {
    pub title: String,
    pub text: String,
    pub image_url: String,
    pub action_url: String,
}

/// An outgoing message to send through a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub target: DeliveryTarget,
    pub payload: Payload,
    pub metadata: MessageMetadata,
}

/// Metadata about how a reply was produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Which provider produced this response.
    pub provider_used: String,
    /// Token count (if reported by the provider).
    pub tokens_used: Option<u64>,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Model identifier (if applicable).
    pub model: Option<String>,
}

/// A completion returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub metadata: MessageMetadata,
}

/// A headline returned by the news feed collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
}
