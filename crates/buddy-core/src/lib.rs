use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Speaker label used when a conversation is rendered into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Coach",
        }
    }
}

#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Completion failed: {0}")]
    CompletionError(String),

    #[error("Delivery failed: {0}")]
    DeliveryError(String),

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, BuddyError>;

/// Text generation for a single prompt. Implementations make one call, no retry.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Delivers a text message to a fixed destination.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<()>;
}
