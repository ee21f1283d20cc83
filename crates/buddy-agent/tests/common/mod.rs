#![allow(dead_code)]

use async_trait::async_trait;
use buddy_client::telegram::InlineKeyboardMarkup;
use buddy_client::BotApi;
use buddy_conversation::{ConversationMemoryService, ConversationStore};
use buddy_core::{CompletionClient, MessageSender, Result};
use mockall::mock;
use std::sync::Arc;
use tempfile::TempDir;

mock! {
    pub Completion {}

    #[async_trait]
    impl CompletionClient for Completion {
        async fn generate(&self, prompt: &str) -> Result<String>;
    }
}

mock! {
    pub Sender {}

    #[async_trait]
    impl MessageSender for Sender {
        async fn deliver(&self, text: &str) -> Result<()>;
    }
}

mock! {
    pub Bot {}

    #[async_trait]
    impl BotApi for Bot {
        async fn send_message(
            &self,
            chat_id: i64,
            text: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<()>;

        async fn edit_message_text(
            &self,
            chat_id: i64,
            message_id: i64,
            text: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<()>;

        async fn answer_callback_query(&self, callback_query_id: &str, text: &str, show_alert: bool) -> Result<()>;
    }
}

pub fn memory_in(dir: &TempDir) -> Arc<ConversationMemoryService> {
    Arc::new(ConversationMemoryService::new(ConversationStore::new(dir.path())))
}
