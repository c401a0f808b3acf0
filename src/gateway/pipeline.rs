//! Event processing pipeline — the main handle_event flow.

use super::keywords::{self, NewsQuery, ReminderParse};
use super::Gateway;
use chrono::Utc;
use iris_channels::line::template;
use iris_core::message::{
    DeliveryTarget, EventKind, IncomingEvent, MessageMetadata, OutgoingMessage, Payload,
};
use tracing::{error, info, warn};

/// Reply substituted when the news feed is unreachable.
const NEWS_FALLBACK: &str = "新聞服務暫時無法使用，請稍後再試。";
/// Reply when the feed answered but had nothing to show.
const NEWS_EMPTY: &str = "目前沒有找到相關新聞。";

impl Gateway {
    /// Process a single inbound event. Every text event produces exactly
    /// one reply, even under total upstream failure.
    pub(super) async fn handle_event(&self, event: IncomingEvent) {
        match event.kind.clone() {
            EventKind::Text { text } => self.handle_text(&event, &text).await,
            EventKind::MemberJoined => self.handle_join(&event).await,
            EventKind::Postback { data } => {
                info!("postback from {}: {data}", event.user_id);
            }
        }
    }

    async fn handle_text(&self, event: &IncomingEvent, text: &str) {
        let preview = if text.chars().count() > 60 {
            let truncated: String = text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            text.to_string()
        };
        info!("[{}] says: {preview}", event.user_id);

        // First contact opts the user into broadcasts.
        self.subscribers.subscribe(&event.user_id).await;

        // Reminder patterns take precedence over a completion call.
        match keywords::parse_reminder(text, self.clock.now()) {
            ReminderParse::Scheduled { due_at, message } => {
                let effective = self
                    .reminders
                    .add(&event.user_id, due_at.with_timezone(&Utc), &message)
                    .await;
                let local = effective.with_timezone(&self.clock.now().timezone());
                let confirm = format!("好的，{} 會提醒你：{message}", local.format("%H:%M"));
                self.respond(event, Payload::Text(confirm)).await;
            }
            ReminderParse::Invalid => {
                self.respond(event, Payload::Text(keywords::REMINDER_USAGE_HINT.to_string()))
                    .await;
            }
            ReminderParse::NotReminder => {
                if let Some(query) = keywords::parse_news(text) {
                    self.handle_news(event, query).await;
                } else {
                    let reply = self.coordinator.handle_turn(&event.user_id, text).await;
                    self.respond(event, Payload::Text(reply)).await;
                }
            }
        }
    }

    async fn handle_news(&self, event: &IncomingEvent, query: NewsQuery) {
        let (category, q) = match query {
            NewsQuery::Top => (None, None),
            NewsQuery::Category(slug) => (Some(slug), None),
            NewsQuery::Keyword(keyword) => (None, Some(keyword)),
        };

        match self.news.top_headlines(category, q.as_deref()).await {
            Ok(headlines) if headlines.is_empty() => {
                self.respond(event, Payload::Text(NEWS_EMPTY.to_string()))
                    .await;
            }
            Ok(headlines) => {
                // Text digest when no headline carries an image.
                let payload = template::news_carousel("新聞精選", &headlines)
                    .unwrap_or_else(|| Payload::Text(template::news_text(&headlines)));
                self.respond(event, payload).await;
            }
            Err(e) => {
                warn!("news fetch failed: {e}");
                self.respond(event, Payload::Text(NEWS_FALLBACK.to_string()))
                    .await;
            }
        }
    }

    async fn handle_join(&self, event: &IncomingEvent) {
        self.subscribers.subscribe(&event.user_id).await;

        let name = match &event.group_id {
            Some(group_id) => self
                .channel
                .member_profile(group_id, &event.user_id)
                .await
                .unwrap_or_else(|e| {
                    warn!("profile lookup failed: {e}");
                    None
                }),
            None => None,
        };

        let text = match name {
            Some(name) => format!("{name}，歡迎加入！"),
            None => "歡迎加入！".to_string(),
        };
        self.respond(event, Payload::Text(text)).await;
    }

    /// Reply using the event's reply token when present, else push.
    async fn respond(&self, event: &IncomingEvent, payload: Payload) {
        let target = match &event.reply_token {
            Some(token) => DeliveryTarget::Reply(token.clone()),
            None => DeliveryTarget::Push(event.user_id.clone()),
        };
        let message = OutgoingMessage {
            target,
            payload,
            metadata: MessageMetadata::default(),
        };
        if let Err(e) = self.channel.send(message).await {
            error!("failed to deliver reply to {}: {e}", event.user_id);
        }
    }
}
