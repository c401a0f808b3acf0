//! Message delivery: replies, pushes, and profile lookups.

use super::types::LineProfile;
use super::LineChannel;
use async_trait::async_trait;
use iris_core::{
    error::IrisError,
    message::{CarouselColumn, DeliveryTarget, OutgoingMessage, Payload},
    traits::Channel,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Bound on every Messaging API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Template field limits from the Messaging API.
const COLUMN_TITLE_MAX: usize = 40;
const COLUMN_TEXT_MAX: usize = 60;

#[async_trait]
impl Channel for LineChannel {
    fn name(&self) -> &str {
        "line"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), IrisError> {
        let messages = json!([payload_json(&message.payload)]);
        let (endpoint, body) = match &message.target {
            DeliveryTarget::Reply(token) => (
                "reply",
                json!({ "replyToken": token, "messages": messages }),
            ),
            DeliveryTarget::Push(user_id) => {
                ("push", json!({ "to": user_id, "messages": messages }))
            }
        };

        let url = format!("{}/message/{endpoint}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.channel_access_token),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| IrisError::Channel(format!("line {endpoint} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(IrisError::Channel(format!(
                "line {endpoint} failed ({status}): {error_text}"
            )));
        }

        Ok(())
    }

    async fn member_profile(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<String>, IrisError> {
        let url = format!("{}/group/{group_id}/member/{user_id}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.channel_access_token),
            )
            .send()
            .await
            .map_err(|e| IrisError::Channel(format!("line profile lookup failed: {e}")))?;

        if !resp.status().is_success() {
            // Best-effort: members can hide their profile from bots.
            warn!(
                "line profile lookup for {user_id} returned {}",
                resp.status()
            );
            return Ok(None);
        }

        let profile: LineProfile = resp
            .json()
            .await
            .map_err(|e| IrisError::Channel(format!("line profile parse failed: {e}")))?;

        Ok(Some(profile.display_name))
    }

    async fn stop(&self) -> Result<(), IrisError> {
        info!("LINE channel stopped");
        Ok(())
    }
}

/// Convert a payload to one Messaging API message object.
pub(super) fn payload_json(payload: &Payload) -> Value {
    match payload {
        Payload::Text(text) => json!({ "type": "text", "text": text }),
        Payload::Carousel { alt_text, columns } => json!({
            "type": "template",
            "altText": alt_text,
            "template": {
                "type": "carousel",
                "columns": columns.iter().map(column_json).collect::<Vec<_>>(),
            },
        }),
    }
}

fn column_json(column: &CarouselColumn) -> Value {
    json!({
        "thumbnailImageUrl": column.image_url,
        "title": truncate_chars(&column.title, COLUMN_TITLE_MAX),
        "text": truncate_chars(&column.text, COLUMN_TEXT_MAX),
        "actions": [{
            "type": "uri",
            "label": "閱讀全文",
            "uri": column.action_url,
        }],
    })
}

/// Truncate to a character count, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
