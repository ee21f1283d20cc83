use buddy_client::telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, TelegramMessage, TelegramUpdate,
};
use buddy_client::BotApi;
use buddy_core::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::chat::{ChatService, APOLOGY_MESSAGE};

pub const TEST_MENU_TEXT: &str = "Test functionality activated! Choose a button:";
pub const TOAST_TEXT: &str = "🍞 Toast notification displayed!";
pub const ALERT_TEXT: &str = "🚨 Alert notification displayed!";
pub const RESET_TEXT: &str = "🧹 Je gespreksgeschiedenis is gewist. We beginnen opnieuw!";

pub const TOGGLE_THREE_STATE: &str = "toggle_three_state";
pub const TOGGLE_TWO_STATE: &str = "toggle_two_state";
pub const SHOW_TOAST: &str = "show_toast";
pub const SHOW_ALERT: &str = "show_alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Red,
    Yellow,
    Green,
}

impl Indicator {
    pub fn emoji(&self) -> &'static str {
        match self {
            Indicator::Red => "🔴",
            Indicator::Yellow => "🟡",
            Indicator::Green => "🟢",
        }
    }

    fn next_of_three(self) -> Self {
        match self {
            Indicator::Red => Indicator::Yellow,
            Indicator::Yellow => Indicator::Green,
            Indicator::Green => Indicator::Red,
        }
    }

    fn next_of_two(self) -> Self {
        match self {
            Indicator::Red => Indicator::Green,
            _ => Indicator::Red,
        }
    }
}

/// Toggle positions of the `/test` keyboard for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub three_state: Indicator,
    pub two_state: Indicator,
}

impl Default for ButtonState {
    fn default() -> Self {
        Self {
            three_state: Indicator::Red,
            two_state: Indicator::Red,
        }
    }
}

/// In-memory per-user button state. Not persisted; resets on restart.
#[derive(Debug, Default)]
pub struct ButtonStateStore {
    states: Mutex<HashMap<i64, ButtonState>>,
}

impl ButtonStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> ButtonState {
        self.update(user_id, |_| {})
    }

    pub fn toggle_three_state(&self, user_id: i64) -> ButtonState {
        self.update(user_id, |s| s.three_state = s.three_state.next_of_three())
    }

    pub fn toggle_two_state(&self, user_id: i64) -> ButtonState {
        self.update(user_id, |s| s.two_state = s.two_state.next_of_two())
    }

    fn update(&self, user_id: i64, f: impl FnOnce(&mut ButtonState)) -> ButtonState {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(user_id).or_default();
        f(state);
        *state
    }
}

pub fn test_keyboard(state: &ButtonState) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::single_column([
        InlineKeyboardButton::callback(format!("3StateButton {}", state.three_state.emoji()), TOGGLE_THREE_STATE),
        InlineKeyboardButton::callback(format!("2StateButton {}", state.two_state.emoji()), TOGGLE_TWO_STATE),
        InlineKeyboardButton::callback("ToastButton", SHOW_TOAST),
        InlineKeyboardButton::callback("AlertButton", SHOW_ALERT),
    ])
}

/// Dispatches Telegram updates, from either the webhook or long polling.
pub struct TelegramBot {
    api: Arc<dyn BotApi>,
    chat: Arc<ChatService>,
    buttons: ButtonStateStore,
}

impl TelegramBot {
    pub fn new(api: Arc<dyn BotApi>, chat: Arc<ChatService>) -> Self {
        Self {
            api,
            chat,
            buttons: ButtonStateStore::new(),
        }
    }

    pub fn button_states(&self) -> &ButtonStateStore {
        &self.buttons
    }

    pub async fn handle_update(&self, update: TelegramUpdate) -> Result<()> {
        debug!("Handling update {}", update.update_id);

        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }

        debug!("Ignoring update {} without message or callback", update.update_id);
        Ok(())
    }

    async fn handle_message(&self, message: TelegramMessage) -> Result<()> {
        let Some(user_id) = message.from.as_ref().map(|u| u.id) else {
            warn!("Received message without sender");
            return Ok(());
        };
        let chat_id = message.chat.id;

        match message.command() {
            Some("test") => {
                let state = self.buttons.get(user_id);
                return self.api.send_message(chat_id, TEST_MENU_TEXT, Some(test_keyboard(&state))).await;
            }
            Some("reset") => {
                self.chat.memory().clear_user_conversation(user_id);
                info!("User {} reset their conversation", user_id);
                return self.api.send_message(chat_id, RESET_TEXT, None).await;
            }
            Some(other) => {
                debug!("Ignoring unknown command /{}", other);
                return Ok(());
            }
            None => {}
        }

        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };

        match self.chat.handle_chat_message(user_id, text).await {
            Ok(Some(reply)) => self.api.send_message(chat_id, &reply, None).await,
            Ok(None) => Ok(()),
            Err(e) => {
                error!("Error handling chat message: {}", e);
                self.api.send_message(chat_id, APOLOGY_MESSAGE, None).await
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<()> {
        let user_id = query.from.id;

        match query.data.as_deref() {
            Some(TOGGLE_THREE_STATE) => {
                let state = self.buttons.toggle_three_state(user_id);
                self.refresh_test_menu(&query, &state).await?;
                self.api.answer_callback_query(&query.id, "", false).await
            }
            Some(TOGGLE_TWO_STATE) => {
                let state = self.buttons.toggle_two_state(user_id);
                self.refresh_test_menu(&query, &state).await?;
                self.api.answer_callback_query(&query.id, "", false).await
            }
            Some(SHOW_TOAST) => self.api.answer_callback_query(&query.id, TOAST_TEXT, false).await,
            Some(SHOW_ALERT) => self.api.answer_callback_query(&query.id, ALERT_TEXT, true).await,
            other => {
                debug!("Ignoring callback data {:?}", other);
                self.api.answer_callback_query(&query.id, "", false).await
            }
        }
    }

    async fn refresh_test_menu(&self, query: &CallbackQuery, state: &ButtonState) -> Result<()> {
        let Some(message) = &query.message else {
            warn!("Callback {} has no message to edit", query.id);
            return Ok(());
        };

        self.api
            .edit_message_text(message.chat.id, message.message_id, TEST_MENU_TEXT, Some(test_keyboard(state)))
            .await
    }
}
