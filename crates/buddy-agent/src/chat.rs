use buddy_conversation::{format_conversation_history_for_prompt, ConversationMemoryService};
use buddy_core::{CompletionClient, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Sent to the user instead of a reply when a chat turn fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I'm having trouble processing your message right now. Please try again later.";

pub fn is_slash_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Full completion prompt for one chat turn. `memory_context` is the output of
/// [`format_conversation_history_for_prompt`] and may be empty.
pub fn build_chat_prompt(memory_context: &str, message: &str) -> String {
    format!(
        "You are a supportive weight loss coach.\n\n{}A user has sent you this message: \"{}\".\n\
         Please respond helpfully and supportively to their message.\n\
         Keep your response under 600 characters and write in Dutch without using a greeting.",
        memory_context, message
    )
}

/// Relays free-text chat through the completion service with per-user memory.
pub struct ChatService {
    completion: Arc<dyn CompletionClient>,
    memory: Arc<ConversationMemoryService>,
}

impl ChatService {
    pub fn new(completion: Arc<dyn CompletionClient>, memory: Arc<ConversationMemoryService>) -> Self {
        Self { completion, memory }
    }

    pub fn memory(&self) -> &ConversationMemoryService {
        &self.memory
    }

    /// `Ok(None)` for commands and blank text, which are not sent to the model.
    /// Memory is only updated once a reply has been generated.
    #[instrument(skip(self, text))]
    pub async fn handle_chat_message(&self, user_id: i64, text: &str) -> Result<Option<String>> {
        let message = text.trim();
        if message.is_empty() || is_slash_command(message) {
            debug!("Not a chat message, skipping");
            return Ok(None);
        }

        let history = self.memory.get_user_conversation_history(user_id);
        let summary = self.memory.get_conversation_summary(user_id);
        let context = format_conversation_history_for_prompt(&history, Some(&summary));

        let reply = self
            .completion
            .generate(&build_chat_prompt(&context, message))
            .await?;

        self.memory.add_exchange(user_id, message, reply.as_str());

        info!("Answered chat message ({} messages in context)", history.len());
        Ok(Some(reply))
    }
}
