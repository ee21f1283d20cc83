mod common;

use buddy_agent::bot::{ALERT_TEXT, RESET_TEXT, TEST_MENU_TEXT, TOAST_TEXT};
use buddy_agent::{ChatService, Indicator, TelegramBot, APOLOGY_MESSAGE};
use buddy_client::telegram::TelegramUpdate;
use buddy_core::BuddyError;
use common::{memory_in, MockBot, MockCompletion};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn text_update(user_id: i64, text: &str) -> TelegramUpdate {
    serde_json::from_value(json!({
        "update_id": 1,
        "message": {
            "message_id": 100,
            "from": { "id": user_id, "is_bot": false, "first_name": "Test" },
            "chat": { "id": user_id, "type": "private" },
            "date": 1700000000,
            "text": text
        }
    }))
    .unwrap()
}

fn callback_update(user_id: i64, data: &str) -> TelegramUpdate {
    serde_json::from_value(json!({
        "update_id": 2,
        "callback_query": {
            "id": "cb-1",
            "from": { "id": user_id, "is_bot": false, "first_name": "Test" },
            "message": {
                "message_id": 100,
                "chat": { "id": user_id, "type": "private" },
                "date": 1700000000,
                "text": TEST_MENU_TEXT
            },
            "data": data
        }
    }))
    .unwrap()
}

fn bot_with(api: MockBot, completion: MockCompletion, dir: &TempDir) -> TelegramBot {
    let chat = ChatService::new(Arc::new(completion), memory_in(dir));
    TelegramBot::new(Arc::new(api), Arc::new(chat))
}

#[tokio::test]
async fn test_chat_message_gets_reply() {
    let dir = TempDir::new().unwrap();
    let mut completion = MockCompletion::new();
    completion.expect_generate().returning(|_| Ok("Lekker bezig!".to_string()));

    let mut api = MockBot::new();
    api.expect_send_message()
        .withf(|chat_id, text, keyboard| *chat_id == 5 && text == "Lekker bezig!" && keyboard.is_none())
        .times(1)
        .returning(|_, _, _| Ok(()));

    let bot = bot_with(api, completion, &dir);
    bot.handle_update(text_update(5, "Ik heb 10.000 stappen gezet")).await.unwrap();
}

#[tokio::test]
async fn test_completion_failure_sends_apology() {
    let dir = TempDir::new().unwrap();
    let mut completion = MockCompletion::new();
    completion
        .expect_generate()
        .returning(|_| Err(BuddyError::CompletionError("boom".to_string())));

    let mut api = MockBot::new();
    api.expect_send_message()
        .withf(|_, text, _| text == APOLOGY_MESSAGE)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let bot = bot_with(api, completion, &dir);
    bot.handle_update(text_update(5, "Hallo")).await.unwrap();
}

#[tokio::test]
async fn test_test_command_sends_keyboard() {
    let dir = TempDir::new().unwrap();
    let mut completion = MockCompletion::new();
    completion.expect_generate().times(0);

    let mut api = MockBot::new();
    api.expect_send_message()
        .withf(|_, text, keyboard| {
            let labels: Vec<String> = keyboard
                .as_ref()
                .map(|k| k.buttons().map(|b| b.text.clone()).collect())
                .unwrap_or_default();
            text == TEST_MENU_TEXT
                && labels == ["3StateButton 🔴", "2StateButton 🔴", "ToastButton", "AlertButton"]
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let bot = bot_with(api, completion, &dir);
    bot.handle_update(text_update(9, "/test")).await.unwrap();
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let dir = TempDir::new().unwrap();
    let mut completion = MockCompletion::new();
    completion.expect_generate().times(0);
    let mut api = MockBot::new();
    api.expect_send_message().times(0);

    let bot = bot_with(api, completion, &dir);
    bot.handle_update(text_update(9, "/weather")).await.unwrap();
}

#[tokio::test]
async fn test_reset_clears_memory() {
    let dir = TempDir::new().unwrap();
    let memory = memory_in(&dir);
    memory.add_user_message(11, "Oud bericht");

    let mut api = MockBot::new();
    api.expect_send_message()
        .withf(|_, text, _| text == RESET_TEXT)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let chat = ChatService::new(Arc::new(MockCompletion::new()), memory.clone());
    let bot = TelegramBot::new(Arc::new(api), Arc::new(chat));
    bot.handle_update(text_update(11, "/reset")).await.unwrap();

    assert!(memory.get_user_conversation_history(11).is_empty());
}

#[tokio::test]
async fn test_three_state_toggle_edits_menu() {
    let dir = TempDir::new().unwrap();
    let mut api = MockBot::new();
    api.expect_edit_message_text()
        .withf(|chat_id, message_id, text, keyboard| {
            let first = keyboard.as_ref().and_then(|k| k.buttons().next()).map(|b| b.text.clone());
            *chat_id == 3
                && *message_id == 100
                && text == TEST_MENU_TEXT
                && first.as_deref() == Some("3StateButton 🟡")
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    api.expect_answer_callback_query()
        .withf(|id, _, show_alert| id == "cb-1" && !*show_alert)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let bot = bot_with(api, MockCompletion::new(), &dir);
    bot.handle_update(callback_update(3, "toggle_three_state")).await.unwrap();

    assert_eq!(bot.button_states().get(3).three_state, Indicator::Yellow);
    assert_eq!(bot.button_states().get(3).two_state, Indicator::Red);
}

#[tokio::test]
async fn test_toast_and_alert_answers() {
    let dir = TempDir::new().unwrap();
    let mut api = MockBot::new();
    api.expect_answer_callback_query()
        .withf(|_, text, show_alert| text == TOAST_TEXT && !*show_alert)
        .times(1)
        .returning(|_, _, _| Ok(()));
    api.expect_answer_callback_query()
        .withf(|_, text, show_alert| text == ALERT_TEXT && *show_alert)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let bot = bot_with(api, MockCompletion::new(), &dir);
    bot.handle_update(callback_update(4, "show_toast")).await.unwrap();
    bot.handle_update(callback_update(4, "show_alert")).await.unwrap();
}
