//! Intent classification.

use crate::backend::{LlmBackend, LlmMessage, LlmRequest};
use crate::error::LlmError;
use crate::intent::{ClassifiedUtterance, Entities, Intent};
use crate::prompt;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What the classifier knows about the conversation so far.
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    /// Budget currently in focus.
    pub active_budget: Option<String>,
    /// Recent messages, oldest first.
    pub recent: Vec<LlmMessage>,
}

/// Turns an utterance into an intent and entities.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifies one utterance.
    ///
    /// Never fails: any internal failure yields
    /// [`ClassifiedUtterance::unknown`].
    async fn classify(&self, text: &str, context: &ClassifierContext) -> ClassifiedUtterance;
}

/// Classifier backed by a chat-completion model in JSON mode.
pub struct LlmIntentClassifier {
    backend: Arc<dyn LlmBackend>,
    temperature: f32,
}

impl LlmIntentClassifier {
    /// Creates a classifier over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            temperature: 0.3,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, text: &str, context: &ClassifierContext) -> LlmRequest {
        LlmRequest::new(text)
            .with_system(prompt::classification_system(
                context.active_budget.as_deref(),
            ))
            .with_context(context.recent.clone())
            .with_json_output()
            .with_temperature(self.temperature)
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    #[instrument(skip(self, text, context), fields(model = %self.backend.model()))]
    async fn classify(&self, text: &str, context: &ClassifierContext) -> ClassifiedUtterance {
        let request = self.build_request(text, context);
        let parsed = match self.backend.generate(&request).await {
            Ok(response) => parse_classification(&response.content),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(utterance) => {
                debug!(
                    intent = %utterance.intent,
                    confidence = utterance.confidence,
                    "classified utterance"
                );
                utterance
            }
            Err(e) => {
                warn!(error = %e, "classification failed, treating as unknown");
                ClassifiedUtterance::unknown()
            }
        }
    }
}

/// Parses the model's JSON answer.
///
/// Malformed entities are dropped rather than discarding the intent.
///
/// # Errors
///
/// Returns an error if the text is not a JSON object with an `intent`.
pub fn parse_classification(raw: &str) -> Result<ClassifiedUtterance, LlmError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let mut utterance = match serde_json::from_value::<ClassifiedUtterance>(value.clone()) {
        Ok(utterance) => utterance,
        Err(e) => {
            let intent = value
                .get("intent")
                .cloned()
                .ok_or_else(|| LlmError::ResponseParseFailed {
                    reason: "missing intent".to_string(),
                })?;
            let intent: Intent =
                serde_json::from_value(intent).map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;
            warn!(error = %e, intent = %intent, "dropping malformed entities");
            ClassifiedUtterance {
                intent,
                entities: Entities::default(),
                confidence: value
                    .get("confidence")
                    .and_then(JsonValue::as_f64)
                    .unwrap_or(1.0),
                needs_context: true,
            }
        }
    };

    utterance.confidence = utterance.confidence.clamp(0.0, 1.0);
    Ok(utterance)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}
