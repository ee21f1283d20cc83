use buddy_core::{Message, MessageRole};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::conversation::{UserConversation, NO_HISTORY_SUMMARY};
use crate::storage::ConversationStore;
use crate::summary::{should_update_conversation_summary, PatternSummaryStrategy, SummaryStrategy};

/// Per-user conversation memory on top of a [`ConversationStore`].
///
/// Every operation is a full load-modify-save of the document. Calls within
/// one process are serialized, so concurrent handlers cannot drop each
/// other's updates.
pub struct ConversationMemoryService {
    store: ConversationStore,
    strategy: Box<dyn SummaryStrategy>,
    lock: Mutex<()>,
}

impl ConversationMemoryService {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            strategy: Box::new(PatternSummaryStrategy),
            lock: Mutex::new(()),
        }
    }

    pub fn with_strategy(mut self, strategy: impl SummaryStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded section holds no state of its own, so a poisoned lock is safe to reuse
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn initialize_conversation_memory(&self) {
        let _guard = self.guard();
        self.store.initialize();
    }

    pub fn add_message(&self, user_id: i64, role: MessageRole, content: impl Into<String>) {
        self.append(user_id, [Message::new(role, content)]);
    }

    /// Store a user message and its reply as one update, so concurrent turns
    /// for the same user cannot interleave.
    pub fn add_exchange(&self, user_id: i64, user_content: impl Into<String>, assistant_content: impl Into<String>) {
        self.append(
            user_id,
            [
                Message::new(MessageRole::User, user_content),
                Message::new(MessageRole::Assistant, assistant_content),
            ],
        );
    }

    fn append(&self, user_id: i64, messages: impl IntoIterator<Item = Message>) {
        let _guard = self.guard();
        let mut memory = self.store.load();

        let conversation = memory.entry(user_id).or_insert_with(UserConversation::new);
        for message in messages {
            conversation.push(message);

            if !conversation.has_summary() && should_update_conversation_summary(conversation, Utc::now()) {
                self.update_conversation_summary(conversation);
                debug!("Refreshed summary for user {}", user_id);
            }
        }

        self.store.save(&memory);
    }

    pub fn add_user_message(&self, user_id: i64, content: impl Into<String>) {
        self.add_message(user_id, MessageRole::User, content);
    }

    pub fn add_assistant_message(&self, user_id: i64, content: impl Into<String>) {
        self.add_message(user_id, MessageRole::Assistant, content);
    }

    pub fn get_user_conversation_history(&self, user_id: i64) -> Vec<Message> {
        let _guard = self.guard();
        self.store
            .load()
            .remove(&user_id)
            .map(|conversation| conversation.messages)
            .unwrap_or_default()
    }

    pub fn clear_user_conversation(&self, user_id: i64) {
        let _guard = self.guard();
        let mut memory = self.store.load();

        if memory.remove(&user_id).is_some() {
            self.store.save(&memory);
            info!("Cleared conversation memory for user {}", user_id);
        }
    }

    pub fn get_conversation_summary(&self, user_id: i64) -> String {
        let _guard = self.guard();
        self.store
            .load()
            .remove(&user_id)
            .map(|conversation| conversation.summary)
            .unwrap_or_else(|| NO_HISTORY_SUMMARY.to_string())
    }

    /// Overwrite the summary. Once set, automatic recomputation stops for this user.
    pub fn set_conversation_summary(&self, user_id: i64, summary: impl Into<String>) {
        let _guard = self.guard();
        let mut memory = self.store.load();

        let conversation = memory.entry(user_id).or_insert_with(UserConversation::new);
        conversation.summary = summary.into();
        conversation.last_summary_update = Utc::now();

        self.store.save(&memory);
    }

    /// Recompute the summary of `conversation` in place with the configured strategy.
    pub fn update_conversation_summary(&self, conversation: &mut UserConversation) {
        conversation.summary = self.strategy.summarize(&conversation.messages);
        conversation.last_summary_update = Utc::now();
    }
}

/// Render stored context for inclusion in a completion prompt.
///
/// Empty when there is neither a meaningful summary nor any history.
pub fn format_conversation_history_for_prompt(history: &[Message], summary: Option<&str>) -> String {
    let mut formatted = String::new();

    if let Some(summary) = summary.filter(|s| !s.is_empty() && *s != NO_HISTORY_SUMMARY) {
        formatted.push_str(&format!("Conversation Summary: {}\n\n", summary));
    }

    if !history.is_empty() {
        let lines: Vec<String> = history
            .iter()
            .map(|m| format!("{}: {}", m.role.prompt_label(), m.content))
            .collect();
        formatted.push_str("Recent conversation:\n");
        formatted.push_str(&lines.join("\n"));
        formatted.push_str("\n\n");
    }

    formatted
}
