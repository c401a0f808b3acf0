//! Webhook server — receives LINE events and forwards them to the gateway.
//!
//! The only authenticated surface: every callback body is checked against
//! its `X-Line-Signature` header before anything is parsed. Rejected events
//! cause no state change.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use iris_channels::line::signature;
use iris_channels::line::types::{LineEvent, WebhookRequest};
use iris_core::message::{EventKind, IncomingEvent};
use serde_json::{json, Value};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct ApiState {
    channel_secret: String,
    tx: mpsc::Sender<IncomingEvent>,
    started: Instant,
}

impl ApiState {
    pub fn new(channel_secret: String, tx: mpsc::Sender<IncomingEvent>) -> Self {
        Self {
            channel_secret,
            tx,
            started: Instant::now(),
        }
    }
}

/// Build the axum router with shared state.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/callback", post(callback))
        .route("/health", get(health))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(host: String, port: u16, state: ApiState) {
    let addr = format!("{host}:{port}");
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("webhook server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("webhook server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("webhook server error: {e}");
    }
}

async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

async fn callback(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header_signature = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Err(e) = signature::verify(&state.channel_secret, &body, header_signature) {
        warn!("webhook rejected: {e}");
        return (StatusCode::BAD_REQUEST, "bad signature");
    }

    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("webhook body did not parse: {e}");
            return (StatusCode::BAD_REQUEST, "bad payload");
        }
    };

    for event in request.events {
        for incoming in map_events(event) {
            if state.tx.send(incoming).await.is_err() {
                error!("gateway receiver dropped");
                return (StatusCode::SERVICE_UNAVAILABLE, "shutting down");
            }
        }
    }

    (StatusCode::OK, "OK")
}

/// Map one webhook event to gateway events.
///
/// `memberJoined` fans out to one event per joined member; unknown kinds
/// and non-text messages are dropped here.
fn map_events(event: LineEvent) -> Vec<IncomingEvent> {
    let timestamp = event
        .timestamp
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);
    let source = match event.source {
        Some(source) => source,
        None => return Vec::new(),
    };

    match event.event_type.as_str() {
        "message" => {
            let Some(user_id) = source.user_id else {
                return Vec::new();
            };
            let Some(message) = event.message else {
                return Vec::new();
            };
            if message.message_type != "text" {
                debug!("ignoring {} message from {user_id}", message.message_type);
                return Vec::new();
            }
            let Some(text) = message.text else {
                return Vec::new();
            };
            vec![IncomingEvent {
                id: Uuid::new_v4(),
                kind: EventKind::Text { text },
                user_id,
                group_id: source.group_id,
                reply_token: event.reply_token,
                timestamp,
            }]
        }
        "memberJoined" => event
            .joined
            .map(|joined| joined.members)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|member| member.user_id)
            .map(|user_id| IncomingEvent {
                id: Uuid::new_v4(),
                kind: EventKind::MemberJoined,
                user_id,
                group_id: source.group_id.clone(),
                reply_token: event.reply_token.clone(),
                timestamp,
            })
            .collect(),
        "postback" => {
            let Some(user_id) = source.user_id else {
                return Vec::new();
            };
            let data = event.postback.map(|p| p.data).unwrap_or_default();
            vec![IncomingEvent {
                id: Uuid::new_v4(),
                kind: EventKind::Postback { data },
                user_id,
                group_id: source.group_id,
                reply_token: event.reply_token,
                timestamp,
            }]
        }
        other => {
            debug!("ignoring event type {other}");
            Vec::new()
        }
    }
}
