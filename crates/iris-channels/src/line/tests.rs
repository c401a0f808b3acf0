use super::send::payload_json;
use super::signature;
use super::template::{news_carousel, news_text};
use super::types::{LineProfile, WebhookRequest};
use iris_core::message::{Headline, Payload};

fn headline(title: &str, url: &str, image: Option<&str>) -> Headline {
    Headline {
        title: title.to_string(),
        url: url.to_string(),
        image_url: image.map(|s| s.to_string()),
    }
}

// --- Carousel template ---

#[test]
fn test_carousel_drops_entries_without_image() {
    let headlines = vec![
        headline("A", "u1", Some("i1")),
        headline("B", "u2", None),
    ];
    let payload = news_carousel("news", &headlines).unwrap();
    match payload {
        Payload::Carousel { columns, .. } => {
            assert_eq!(columns.len(), 1);
            assert_eq!(columns[0].title, "A");
            assert_eq!(columns[0].image_url, "i1");
            assert_eq!(columns[0].action_url, "u1");
        }
        other => panic!("expected carousel, got {other:?}"),
    }
}

#[test]
fn test_carousel_caps_at_five_columns() {
    let headlines: Vec<Headline> = (0..8)
        .map(|i| headline(&format!("t{i}"), &format!("u{i}"), Some("img")))
        .collect();
    let payload = news_carousel("news", &headlines).unwrap();
    match payload {
        Payload::Carousel { columns, .. } => assert_eq!(columns.len(), 5),
        other => panic!("expected carousel, got {other:?}"),
    }
}

#[test]
fn test_carousel_empty_when_no_images() {
    let headlines = vec![headline("A", "u1", None), headline("B", "u2", None)];
    assert!(news_carousel("news", &headlines).is_none());
}

#[test]
fn test_news_text_lists_titles_and_urls() {
    let headlines = vec![headline("A", "u1", None), headline("B", "u2", None)];
    let text = news_text(&headlines);
    assert!(text.contains("A\nu1"));
    assert!(text.contains("B\nu2"));
}

// --- Message payload JSON ---

#[test]
fn test_text_payload_json() {
    let value = payload_json(&Payload::Text("hello".into()));
    assert_eq!(value["type"], "text");
    assert_eq!(value["text"], "hello");
}

#[test]
fn test_carousel_payload_json_shape() {
    let headlines = vec![headline("Title", "https://x/a", Some("https://x/a.jpg"))];
    let payload = news_carousel("今日新聞", &headlines).unwrap();
    let value = payload_json(&payload);
    assert_eq!(value["type"], "template");
    assert_eq!(value["altText"], "今日新聞");
    assert_eq!(value["template"]["type"], "carousel");
    let column = &value["template"]["columns"][0];
    assert_eq!(column["thumbnailImageUrl"], "https://x/a.jpg");
    assert_eq!(column["title"], "Title");
    assert_eq!(column["actions"][0]["type"], "uri");
    assert_eq!(column["actions"][0]["uri"], "https://x/a");
}

#[test]
fn test_carousel_payload_json_truncates_long_title() {
    let long_title = "標".repeat(80);
    let headlines = vec![headline(&long_title, "u", Some("i"))];
    let payload = news_carousel("news", &headlines).unwrap();
    let value = payload_json(&payload);
    let title = value["template"]["columns"][0]["title"].as_str().unwrap();
    assert_eq!(title.chars().count(), 40);
}

// --- Signature ---

#[test]
fn test_signature_round_trip() {
    let secret = "test-channel-secret";
    let body = br#"{"events":[]}"#;
    let sig = signature::sign(secret, body);
    signature::verify(secret, body, &sig).unwrap();
}

#[test]
fn test_signature_rejects_tampered_body() {
    let secret = "test-channel-secret";
    let sig = signature::sign(secret, b"original");
    assert!(signature::verify(secret, b"tampered", &sig).is_err());
}

#[test]
fn test_signature_rejects_garbage_header() {
    assert!(signature::verify("secret", b"body", "not base64 !!!").is_err());
}

// --- Webhook payload parsing ---

#[test]
fn test_webhook_request_parses_text_message_event() {
    let json = r#"{
        "destination": "U0000",
        "events": [{
            "type": "message",
            "replyToken": "r-token",
            "timestamp": 1714550400000,
            "source": { "type": "user", "userId": "U1234" },
            "message": { "type": "text", "id": "m1", "text": "哈囉" }
        }]
    }"#;
    let request: WebhookRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.events.len(), 1);
    let event = &request.events[0];
    assert_eq!(event.event_type, "message");
    assert_eq!(event.reply_token.as_deref(), Some("r-token"));
    let source = event.source.as_ref().unwrap();
    assert_eq!(source.user_id.as_deref(), Some("U1234"));
    let message = event.message.as_ref().unwrap();
    assert_eq!(message.text.as_deref(), Some("哈囉"));
}

#[test]
fn test_webhook_request_parses_member_joined_event() {
    let json = r#"{
        "events": [{
            "type": "memberJoined",
            "replyToken": "r-token",
            "source": { "type": "group", "groupId": "G1" },
            "joined": { "members": [{ "type": "user", "userId": "U9" }] }
        }]
    }"#;
    let request: WebhookRequest = serde_json::from_str(json).unwrap();
    let event = &request.events[0];
    assert_eq!(event.event_type, "memberJoined");
    let joined = event.joined.as_ref().unwrap();
    assert_eq!(joined.members[0].user_id.as_deref(), Some("U9"));
    assert_eq!(
        event.source.as_ref().unwrap().group_id.as_deref(),
        Some("G1")
    );
}

#[test]
fn test_profile_parses_display_name() {
    let profile: LineProfile =
        serde_json::from_str(r#"{"displayName":"小明","userId":"U9"}"#).unwrap();
    assert_eq!(profile.display_name, "小明");
}
