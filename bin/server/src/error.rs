//! Domain error types for server operations.

use std::fmt;

/// Errors turning an inbound media message into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundError {
    /// The media file could not be fetched from the gateway.
    MediaDownload { media_id: String, reason: String },
    /// The transcription provider failed.
    Transcription { reason: String },
    /// The transcription came back empty.
    EmptyTranscription,
}

impl fmt::Display for InboundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaDownload { media_id, reason } => {
                write!(f, "could not download media '{media_id}': {reason}")
            }
            Self::Transcription { reason } => write!(f, "transcription failed: {reason}"),
            Self::EmptyTranscription => write!(f, "transcription was empty"),
        }
    }
}

impl std::error::Error for InboundError {}
