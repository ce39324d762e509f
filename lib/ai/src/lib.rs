//! Language understanding for the budget-chat assistant.
//!
//! This crate provides:
//!
//! - **Backend**: a provider-neutral `LlmBackend` trait for chat completions
//! - **Intents**: the closed set of things a user can ask for, plus the
//!   entities extracted alongside
//! - **Classifier**: turns one utterance into a [`ClassifiedUtterance`],
//!   never failing
//! - **Transcripts**: conservative cleanup of speech-to-text output

pub mod backend;
pub mod classifier;
pub mod error;
pub mod intent;
pub mod prompt;
pub mod transcript;

pub use backend::{LlmBackend, LlmMessage, LlmRequest, LlmResponse, MessageRole, TokenUsage};
pub use classifier::{ClassifierContext, IntentClassifier, LlmIntentClassifier};
pub use error::LlmError;
pub use intent::{ClassifiedUtterance, Entities, Intent, OneOrMany};
pub use transcript::clean_transcription;
