pub mod conversation;
pub mod service;
pub mod storage;
pub mod summary;

pub use conversation::{ConversationMemory, UserConversation, MAX_MESSAGES_PER_USER, NO_HISTORY_SUMMARY};
pub use service::{format_conversation_history_for_prompt, ConversationMemoryService};
pub use storage::{ConversationStore, MEMORY_FILE_NAME};
pub use summary::{
    extract_key_phrases, should_update_conversation_summary, PatternSummaryStrategy, SummaryStrategy,
};
