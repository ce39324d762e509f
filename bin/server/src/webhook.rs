//! HTTP routes: WhatsApp webhook, health check and admin endpoints.
//!
//! Inbound messages are acknowledged with 200 straight away and processed on
//! a spawned task, so the Graph API never times out waiting for a reply.

use crate::error::InboundError;
use crate::llm::OpenAiBackend;
use crate::whatsapp::WhatsAppGateway;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use budget_chat_accounts::JsonFileDirectory;
use budget_chat_ai::clean_transcription;
use budget_chat_core::UserId;
use budget_chat_dialog::{MessageGateway, Orchestrator};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

/// The only webhook object type carrying chat messages.
const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

/// Header carrying the admin token.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

const AUDIO_FAILED: &str = "❌ No pude procesar tu audio. Intenta con texto.";

const MEDIA_NOT_SUPPORTED: &str = "📎 Por ahora solo puedo procesar mensajes de texto y audio. \
     Envíame un mensaje describiendo lo que necesitas.";

/// Shared state for all routes.
pub struct AppState {
    /// Turns utterances into replies.
    pub orchestrator: Orchestrator,
    /// Read receipts, media download and notices.
    pub whatsapp: Arc<WhatsAppGateway>,
    /// Voice note transcription.
    pub llm: Arc<OpenAiBackend>,
    /// Account directory, reloadable by admins.
    pub directory: Arc<JsonFileDirectory>,
    /// Token Meta must echo when verifying the webhook.
    pub verify_token: String,
    /// Token required by admin routes; admin routes refuse every call when unset.
    pub admin_token: Option<String>,
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", get(verify).post(receive))
        .route("/admin/directory/reload", post(reload_directory))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Query parameters of a webhook subscription check.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Returns the challenge to echo if the subscription check is valid.
fn verify_subscription(params: &VerifyParams, expected_token: &str) -> Option<String> {
    let subscribing = params.mode.as_deref() == Some("subscribe");
    let token_matches = params.verify_token.as_deref() == Some(expected_token);
    if subscribing && token_matches {
        params.challenge.clone()
    } else {
        None
    }
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_subscription(&params, &state.verify_token) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!(mode = ?params.mode, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Webhook notification body.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    object: String,
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    from: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextBody>,
    audio: Option<MediaRef>,
    button: Option<ButtonBody>,
    interactive: Option<Interactive>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ButtonBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Interactive {
    button_reply: Option<ButtonReply>,
}

#[derive(Debug, Deserialize)]
struct ButtonReply {
    title: String,
}

/// What an inbound message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InboundContent {
    Text(String),
    Audio { media_id: String },
    Unsupported { kind: String },
}

/// A message worth answering.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InboundMessage {
    id: String,
    from: String,
    content: InboundContent,
}

fn non_empty(text: String) -> Option<InboundContent> {
    (!text.trim().is_empty()).then_some(InboundContent::Text(text))
}

impl RawMessage {
    fn into_inbound(self) -> Option<InboundMessage> {
        let content = match self.kind.as_str() {
            "text" => non_empty(self.text?.body)?,
            "audio" => InboundContent::Audio {
                media_id: self.audio?.id,
            },
            "button" => non_empty(self.button?.text)?,
            "interactive" => non_empty(self.interactive?.button_reply?.title)?,
            "image" | "document" | "video" => InboundContent::Unsupported {
                kind: self.kind.clone(),
            },
            _ => return None,
        };
        Some(InboundMessage {
            id: self.id,
            from: self.from,
            content,
        })
    }
}

/// Extracts the messages to answer from a notification.
fn inbound_messages(payload: WebhookPayload) -> Vec<InboundMessage> {
    if payload.object != BUSINESS_ACCOUNT_OBJECT {
        debug!(object = %payload.object, "ignoring webhook object");
        return Vec::new();
    }
    payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.changes)
        .flat_map(|change| change.value.messages)
        .filter_map(RawMessage::into_inbound)
        .collect()
}

async fn receive(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "unreadable webhook payload");
            return StatusCode::OK;
        }
    };

    for message in inbound_messages(payload) {
        tokio::spawn(handle_inbound(state.clone(), message));
    }
    StatusCode::OK
}

#[instrument(skip_all, fields(message_id = %message.id))]
async fn handle_inbound(state: Arc<AppState>, message: InboundMessage) {
    let user = UserId::from_phone(&message.from);
    if let Err(e) = state.whatsapp.mark_as_read(&message.id).await {
        debug!(error = %e, "could not mark message as read");
    }

    let text = match message.content {
        InboundContent::Text(text) => text,
        InboundContent::Audio { media_id } => match transcribe_audio(&state, &media_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(user = %user, error = %e, "audio message not understood");
                send_notice(&state, &user, AUDIO_FAILED).await;
                return;
            }
        },
        InboundContent::Unsupported { kind } => {
            info!(user = %user, kind = %kind, "unsupported message type");
            send_notice(&state, &user, MEDIA_NOT_SUPPORTED).await;
            return;
        }
    };

    state.orchestrator.process(&user, &text).await;
}

async fn transcribe_audio(state: &AppState, media_id: &str) -> Result<String, InboundError> {
    let audio = state.whatsapp.download_media(media_id).await?;
    let raw = state.llm.transcribe(audio, "audio.ogg").await?;
    let cleaned = clean_transcription(&raw);
    if cleaned.trim().is_empty() {
        return Err(InboundError::EmptyTranscription);
    }
    info!(raw = %raw, cleaned = %cleaned, "transcribed voice note");
    Ok(cleaned)
}

async fn send_notice(state: &AppState, user: &UserId, text: &str) {
    if let Err(e) = state.whatsapp.send_text(user, text).await {
        warn!(user = %user, error = %e, "could not send notice");
    }
}

fn admin_authorized(headers: &HeaderMap, admin_token: Option<&str>) -> bool {
    let Some(expected) = admin_token else {
        return false;
    };
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|given| given == expected)
}

async fn reload_directory(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !admin_authorized(&headers, state.admin_token.as_deref()) {
        warn!("rejected directory reload");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.directory.reload() {
        Ok(total) => Json(serde_json::json!({ "accounts": total })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(mode: &str, token: &str, challenge: &str) -> VerifyParams {
        VerifyParams {
            mode: Some(mode.to_string()),
            verify_token: Some(token.to_string()),
            challenge: Some(challenge.to_string()),
        }
    }

    fn payload(messages: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "messages": messages } }] }]
        }))
        .expect("payload")
    }

    #[test]
    fn subscription_echoes_challenge() {
        let challenge = verify_subscription(&params("subscribe", "secret", "1158201444"), "secret");
        assert_eq!(challenge.as_deref(), Some("1158201444"));
    }

    #[test]
    fn subscription_rejects_wrong_token_or_mode() {
        assert!(verify_subscription(&params("subscribe", "guess", "1"), "secret").is_none());
        assert!(verify_subscription(&params("unsubscribe", "secret", "1"), "secret").is_none());
        assert!(verify_subscription(&VerifyParams::default(), "secret").is_none());
    }

    #[test]
    fn extracts_text_audio_and_button_messages() {
        let messages = inbound_messages(payload(serde_json::json!([
            { "from": "56912345678", "id": "m1", "type": "text",
              "text": { "body": "crear presupuesto Casa" } },
            { "from": "56912345678", "id": "m2", "type": "audio",
              "audio": { "id": "media-9", "mime_type": "audio/ogg" } },
            { "from": "56912345678", "id": "m3", "type": "button",
              "button": { "text": "SI" } },
            { "from": "56912345678", "id": "m4", "type": "interactive",
              "interactive": { "type": "button_reply",
                               "button_reply": { "id": "b1", "title": "Ver total" } } }
        ])));

        let contents: Vec<_> = messages.into_iter().map(|m| m.content).collect();
        assert_eq!(
            contents,
            [
                InboundContent::Text("crear presupuesto Casa".to_string()),
                InboundContent::Audio {
                    media_id: "media-9".to_string()
                },
                InboundContent::Text("SI".to_string()),
                InboundContent::Text("Ver total".to_string()),
            ]
        );
    }

    #[test]
    fn media_is_unsupported_and_unknown_types_are_dropped() {
        let messages = inbound_messages(payload(serde_json::json!([
            { "from": "56912345678", "id": "m1", "type": "image", "image": { "id": "x" } },
            { "from": "56912345678", "id": "m2", "type": "sticker", "sticker": { "id": "y" } },
            { "from": "56912345678", "id": "m3", "type": "text", "text": { "body": "   " } }
        ])));

        assert_eq!(
            messages,
            [InboundMessage {
                id: "m1".to_string(),
                from: "56912345678".to_string(),
                content: InboundContent::Unsupported {
                    kind: "image".to_string()
                },
            }]
        );
    }

    #[test]
    fn other_objects_are_ignored() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "page",
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": "1", "id": "m1", "type": "text", "text": { "body": "hola" } }
            ] } }] }]
        }))
        .expect("payload");

        assert!(inbound_messages(payload).is_empty());
    }

    #[test]
    fn status_updates_carry_no_messages() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "delivered" }] } }] }]
        }))
        .expect("payload");

        assert!(inbound_messages(payload).is_empty());
    }

    #[test]
    fn admin_token_must_match() {
        let mut headers = HeaderMap::new();
        assert!(!admin_authorized(&headers, Some("s3cret")));

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(admin_authorized(&headers, Some("s3cret")));
        assert!(!admin_authorized(&headers, Some("other")));
        assert!(!admin_authorized(&headers, None));
    }
}
