//! OpenAI-compatible chat completion and transcription client.

use crate::config::LlmConfig;
use crate::error::InboundError;
use async_trait::async_trait;
use budget_chat_ai::{LlmBackend, LlmError, LlmRequest, LlmResponse, TokenUsage};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "openai";

/// Chat completion response body.
#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// Talks to an OpenAI-compatible API.
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiBackend {
    /// Creates a backend sharing the given HTTP client.
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Builds the chat completion request body.
    fn chat_body(&self, request: &LlmRequest) -> JsonValue {
        let mut body = json!({
            "model": &self.config.model,
            "messages": request.messages(),
        });
        if request.json_output {
            body["response_format"] = json!({"type": "json_object"});
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    /// Transcribes an audio file.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or yields no text.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<String, InboundError> {
        let transcription_failed = |reason: String| InboundError::Transcription { reason };

        let file = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("audio/ogg")
            .map_err(|e| transcription_failed(e.to_string()))?;
        let form = Form::new()
            .text("model", self.config.transcription_model.clone())
            .text("language", self.config.transcription_language.clone())
            .part("file", file);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transcription_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transcription_failed(format!("status {status}: {body}")));
        }

        let body: TranscriptionBody = response
            .json()
            .await
            .map_err(|e| transcription_failed(e.to_string()))?;
        let text = body.text.trim();
        if text.is_empty() {
            return Err(InboundError::EmptyTranscription);
        }
        debug!(chars = text.chars().count(), "transcribed audio");
        Ok(text.to_string())
    }
}

/// Parses a chat completion body into a response.
fn parse_completion(raw: &str, fallback_model: &str) -> Result<LlmResponse, LlmError> {
    let body: CompletionBody =
        serde_json::from_str(raw).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;

    let usage = body
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        usage,
        model: body.model.unwrap_or_else(|| fallback_model.to_string()),
    })
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip_all, fields(model = %self.config.model, json = request.json_output))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&self.chat_body(request))
            .send()
            .await
            .map_err(|e| LlmError::ProviderUnavailable {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = retry_after_secs(response.headers());
            warn!(?retry_after_secs, "chat completion rate limited");
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("status {status}: {body}"),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;
        let parsed = parse_completion(&raw, &self.config.model)?;
        debug!(tokens = parsed.usage.total(), "chat completion finished");
        Ok(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
