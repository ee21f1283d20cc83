mod common;

use buddy_agent::ChatService;
use buddy_core::{BuddyError, MessageRole};
use common::{memory_in, MockCompletion};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_reply_is_generated_and_remembered() {
    let dir = TempDir::new().unwrap();
    let memory = memory_in(&dir);

    let mut completion = MockCompletion::new();
    completion
        .expect_generate()
        .withf(|prompt| prompt.contains("\"Ik heb vandaag gesport\"") && prompt.contains("under 600 characters"))
        .times(1)
        .returning(|_| Ok("Goed gedaan, ga zo door!".to_string()));

    let chat = ChatService::new(Arc::new(completion), memory.clone());
    let reply = chat.handle_chat_message(42, "  Ik heb vandaag gesport  ").await.unwrap();

    assert_eq!(reply.as_deref(), Some("Goed gedaan, ga zo door!"));

    let history = memory.get_user_conversation_history(42);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "Ik heb vandaag gesport");
    assert_eq!(history[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn test_previous_turns_are_included_in_prompt() {
    let dir = TempDir::new().unwrap();
    let memory = memory_in(&dir);
    memory.add_user_message(7, "Ik wil 5 kilo kwijt");
    memory.add_assistant_message(7, "Dat gaat je lukken!");

    let mut completion = MockCompletion::new();
    completion
        .expect_generate()
        .withf(|prompt| {
            prompt.contains("Recent conversation:\nUser: Ik wil 5 kilo kwijt\nCoach: Dat gaat je lukken!")
                && !prompt.contains("Conversation Summary:")
        })
        .times(1)
        .returning(|_| Ok("Top!".to_string()));

    let chat = ChatService::new(Arc::new(completion), memory);
    chat.handle_chat_message(7, "Hoe begin ik?").await.unwrap();
}

#[tokio::test]
async fn test_commands_and_blank_text_skip_completion() {
    let dir = TempDir::new().unwrap();
    let memory = memory_in(&dir);

    let mut completion = MockCompletion::new();
    completion.expect_generate().times(0);

    let chat = ChatService::new(Arc::new(completion), memory.clone());

    assert_eq!(chat.handle_chat_message(1, "/start").await.unwrap(), None);
    assert_eq!(chat.handle_chat_message(1, "   ").await.unwrap(), None);
    assert!(memory.get_user_conversation_history(1).is_empty());
}

#[tokio::test]
async fn test_failed_completion_leaves_memory_untouched() {
    let dir = TempDir::new().unwrap();
    let memory = memory_in(&dir);

    let mut completion = MockCompletion::new();
    completion
        .expect_generate()
        .returning(|_| Err(BuddyError::CompletionError("timeout".to_string())));

    let chat = ChatService::new(Arc::new(completion), memory.clone());
    let err = chat.handle_chat_message(3, "Hallo").await.unwrap_err();

    assert!(matches!(err, BuddyError::CompletionError(_)));
    assert!(memory.get_user_conversation_history(3).is_empty());
}
