use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a visible line of the negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Counterpart,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Counterpart => write!(f, "counterpart"),
        }
    }
}

/// One visible line of the transcript. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            at,
        }
    }

    pub fn counterpart(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            speaker: Speaker::Counterpart,
            text: text.into(),
            at,
        }
    }
}

/// Role of a message in the LLM-facing conversation. Providers name the
/// assistant side differently; each client maps `Model` to its own term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}
