use buddy_core::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on the message log kept per user. Oldest messages are evicted first.
pub const MAX_MESSAGES_PER_USER: usize = 30;

/// Summary placeholder meaning "nothing has been summarized yet".
pub const NO_HISTORY_SUMMARY: &str = "No conversation history yet.";

/// Everything persisted, keyed by user id.
pub type ConversationMemory = BTreeMap<i64, UserConversation>;

/// A user's bounded message log plus the rolling summary that outlives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConversation {
    pub messages: Vec<Message>,
    #[serde(default = "default_summary")]
    pub summary: String,
    #[serde(default = "Utc::now")]
    pub last_summary_update: DateTime<Utc>,
}

impl UserConversation {
    pub fn new() -> Self {
        Self::with_messages(Vec::new())
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        let mut conversation = Self {
            messages,
            summary: default_summary(),
            last_summary_update: Utc::now(),
        };
        conversation.enforce_bound();
        conversation
    }

    /// Append a message, evicting from the front past [`MAX_MESSAGES_PER_USER`].
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.enforce_bound();
    }

    pub fn has_summary(&self) -> bool {
        self.summary != NO_HISTORY_SUMMARY
    }

    fn enforce_bound(&mut self) {
        if self.messages.len() > MAX_MESSAGES_PER_USER {
            let excess = self.messages.len() - MAX_MESSAGES_PER_USER;
            self.messages.drain(..excess);
        }
    }
}

impl Default for UserConversation {
    fn default() -> Self {
        Self::new()
    }
}

fn default_summary() -> String {
    NO_HISTORY_SUMMARY.to_string()
}

/// On-disk entry as found in the file. Older deployments stored a bare message
/// array per user; those are upgraded to [`UserConversation`] on load.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredConversation {
    Legacy(Vec<Message>),
    Current(UserConversation),
}

impl StoredConversation {
    pub(crate) fn is_legacy(&self) -> bool {
        matches!(self, StoredConversation::Legacy(_))
    }

    pub(crate) fn into_conversation(self) -> UserConversation {
        match self {
            StoredConversation::Legacy(messages) => UserConversation::with_messages(messages),
            StoredConversation::Current(conversation) => conversation,
        }
    }
}
