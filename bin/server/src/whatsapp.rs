//! WhatsApp Cloud API client.
//!
//! Sends text and document messages, marks inbound messages as read, and
//! fetches inbound media for transcription.

use crate::config::WhatsAppConfig;
use crate::error::InboundError;
use async_trait::async_trait;
use budget_chat_core::UserId;
use budget_chat_dialog::{GatewayError, MessageGateway, OutboundDocument};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument};

/// Caption attached to every delivered budget document.
const DOCUMENT_CAPTION: &str = "📄 Presupuesto generado";

#[derive(Debug, Deserialize)]
struct UploadedMedia {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaLocation {
    url: String,
}

fn text_message(to: &str, body: &str) -> JsonValue {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body },
    })
}

fn document_message(to: &str, media_id: &str, filename: &str) -> JsonValue {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "document",
        "document": {
            "id": media_id,
            "filename": filename,
            "caption": DOCUMENT_CAPTION,
        },
    })
}

fn read_receipt(message_id: &str) -> JsonValue {
    json!({
        "messaging_product": "whatsapp",
        "status": "read",
        "message_id": message_id,
    })
}

/// Graph API client for one business phone number.
pub struct WhatsAppGateway {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppGateway {
    /// Creates a gateway sharing the given HTTP client.
    pub fn new(client: reqwest::Client, config: WhatsAppConfig) -> Self {
        Self { client, config }
    }

    fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn phone_url(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.api_base(), self.config.phone_number_id)
    }

    async fn post_message(&self, payload: &JsonValue) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.phone_url("messages"))
            .bearer_auth(&self.config.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::SendFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn upload(&self, document: OutboundDocument) -> Result<String, GatewayError> {
        let upload_failed = |reason: String| GatewayError::UploadFailed { reason };

        let file = Part::bytes(document.bytes)
            .file_name(document.filename)
            .mime_str(&document.mime_type)
            .map_err(|e| upload_failed(e.to_string()))?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", document.mime_type)
            .part("file", file);

        let response = self
            .client
            .post(self.phone_url("media"))
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upload_failed(format!("status {status}: {body}")));
        }

        let uploaded: UploadedMedia = response
            .json()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;
        Ok(uploaded.id)
    }

    /// Marks an inbound message as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the Graph API call fails.
    pub async fn mark_as_read(&self, message_id: &str) -> Result<(), GatewayError> {
        self.post_message(&read_receipt(message_id)).await
    }

    /// Downloads an inbound media file.
    ///
    /// # Errors
    ///
    /// Returns an error if the media URL cannot be resolved or fetched.
    #[instrument(skip(self))]
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>, InboundError> {
        let failed = |reason: String| InboundError::MediaDownload {
            media_id: media_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(format!("{}/{media_id}", self.api_base()))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("lookup status {}", response.status())));
        }
        let location: MediaLocation = response.json().await.map_err(|e| failed(e.to_string()))?;

        let response = self
            .client
            .get(&location.url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("download status {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

        debug!(bytes = bytes.len(), "downloaded media");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MessageGateway for WhatsAppGateway {
    #[instrument(skip(self, text), fields(user = %user))]
    async fn send_text(&self, user: &UserId, text: &str) -> Result<(), GatewayError> {
        self.post_message(&text_message(user.as_str(), text)).await
    }

    #[instrument(skip(self, document), fields(user = %user, filename = %document.filename))]
    async fn send_document(
        &self,
        user: &UserId,
        document: OutboundDocument,
    ) -> Result<(), GatewayError> {
        let filename = document.filename.clone();
        let media_id = self.upload(document).await?;
        debug!(media_id = %media_id, "uploaded document");
        self.post_message(&document_message(user.as_str(), &media_id, &filename))
            .await
    }
}
