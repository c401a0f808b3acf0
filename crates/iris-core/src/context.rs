use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire-format role string for API-based providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged message unit in a conversation history.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation context passed to a completion provider.
///
/// Holds the full ordered turn sequence, system turn first. Providers read
/// it; committing turns back to the store is the session coordinator's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub turns: Vec<Turn>,
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl Context {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Convert the turn sequence to wire-format messages.
    pub fn api_messages(&self) -> Vec<ApiMessage> {
        self.turns
            .iter()
            .map(|t| ApiMessage {
                role: t.role.as_str().to_string(),
                content: t.content.clone(),
            })
            .collect()
    }
}
