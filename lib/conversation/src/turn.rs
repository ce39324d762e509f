//! Conversation turns.

use budget_chat_core::TurnId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person chatting with the assistant.
    User,
    /// The assistant.
    Agent,
}

impl TurnRole {
    /// Returns the storage name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            // "assistant" is what older history rows carry.
            "agent" | "assistant" => Ok(Self::Agent),
            other => Err(format!("unknown turn role: {other}")),
        }
    }
}

/// One message in a user's conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: TurnId,
    /// Who said it.
    pub role: TurnRole,
    /// What was said.
    pub text: String,
    /// Intent that produced an agent reply.
    pub intent: Option<String>,
    /// Entities that produced an agent reply.
    pub entities: Option<JsonValue>,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a new turn.
    #[must_use]
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role,
            text: text.into(),
            intent: None,
            entities: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    /// Creates an agent turn.
    #[must_use]
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Agent, text)
    }

    /// Tags the turn with the classification that produced it.
    #[must_use]
    pub fn with_classification(mut self, intent: impl Into<String>, entities: JsonValue) -> Self {
        self.intent = Some(intent.into());
        self.entities = Some(entities);
        self
    }

    /// Returns true if the user authored this turn.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}
