//! Outbound message transport.

use async_trait::async_trait;
use budget_chat_core::UserId;
use std::fmt;

/// A document to deliver to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundDocument {
    /// File contents.
    pub bytes: Vec<u8>,
    /// File name shown to the user.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
}

/// Errors from message delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request could not be sent.
    SendFailed { reason: String },
    /// The provider rejected the request.
    Rejected { status: u16, body: String },
    /// Uploading a document failed.
    UploadFailed { reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { reason } => write!(f, "message send failed: {reason}"),
            Self::Rejected { status, body } => {
                write!(f, "message rejected with status {status}: {body}")
            }
            Self::UploadFailed { reason } => write!(f, "document upload failed: {reason}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Delivers messages to users.
///
/// Failures are reported, never retried by the caller.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Sends a text message.
    async fn send_text(&self, user: &UserId, text: &str) -> Result<(), GatewayError>;

    /// Sends a document.
    async fn send_document(
        &self,
        user: &UserId,
        document: OutboundDocument,
    ) -> Result<(), GatewayError>;
}
