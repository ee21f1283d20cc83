use buddy_config::TelegramSettings;
use buddy_core::{BuddyError, MessageSender, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub mod types;

pub use types::{
    ApiResponse, CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, TelegramChat,
    TelegramMessage, TelegramUpdate, TelegramUser, WebhookInfo,
};

/// Telegram rejects longer messages.
pub const MAX_MESSAGE_LENGTH: usize = 4096;
const TRUNCATION_MARKER: &str = "...";

// Must outlast the getUpdates long-poll timeout
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Cut `text` to fit in a single Telegram message, counting characters.
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return Cow::Borrowed(text);
    }

    let kept: String = text
        .chars()
        .take(MAX_MESSAGE_LENGTH - TRUNCATION_MARKER.len())
        .collect();
    Cow::Owned(kept + TRUNCATION_MARKER)
}

/// The chat operations the bot dispatcher needs.
#[async_trait::async_trait]
pub trait BotApi: Send + Sync {
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

/// Webhook registration with the Bot API.
#[async_trait::async_trait]
pub trait WebhookApi: Send + Sync {
    async fn set_webhook(&self, url: &str) -> Result<()>;
    async fn delete_webhook(&self) -> Result<()>;
    async fn get_webhook_info(&self) -> Result<WebhookInfo>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a, C: Serialize> {
    chat_id: C,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| BuddyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            bot_token: settings.bot_token.clone(),
            chat_id: settings.chat_id.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if self.bot_token.is_empty() {
            return Err(BuddyError::ConfigError("Telegram bot token is not configured".to_string()));
        }

        debug!("Calling Telegram method {}", method);
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| BuddyError::TelegramError(format!("{} request failed: {}", method, e)))?;

        // Error statuses still carry the JSON envelope with a description
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BuddyError::TelegramError(format!("Invalid {} response: {}", method, e)))?;

        unwrap_envelope(method, envelope)
    }

    /// Long-poll for updates after `offset`, waiting up to `timeout_secs`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<TelegramUpdate>> {
        let mut params = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            params["offset"] = json!(offset);
        }
        self.call("getUpdates", &params).await
    }
}

fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> Result<T> {
    if !envelope.ok {
        let description = envelope
            .description
            .unwrap_or_else(|| "Unknown Telegram API error".to_string());
        warn!("Telegram {} failed: {}", method, description);
        return Err(BuddyError::TelegramError(description));
    }

    envelope
        .result
        .ok_or_else(|| BuddyError::TelegramError(format!("{} returned no result", method)))
}

#[async_trait::async_trait]
impl MessageSender for TelegramClient {
    #[instrument(skip_all, fields(len = text.chars().count()))]
    async fn deliver(&self, text: &str) -> Result<()> {
        if self.chat_id.is_empty() {
            return Err(BuddyError::ConfigError("Telegram chat ID is not configured".to_string()));
        }

        let text = truncate_message(text);
        let request = SendMessageRequest {
            chat_id: self.chat_id.as_str(),
            text: &text,
            parse_mode: Some("HTML"),
            reply_markup: None,
        };

        let result: Result<serde_json::Value> = self.call("sendMessage", &request).await;
        match result {
            Ok(_) => Ok(()),
            Err(e @ BuddyError::ConfigError(_)) => Err(e),
            Err(e) => Err(BuddyError::DeliveryError(format!("Failed to send Telegram message: {}", e))),
        }
    }
}

#[async_trait::async_trait]
impl BotApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let text = truncate_message(text);
        let request = SendMessageRequest {
            chat_id,
            text: &text,
            parse_mode: None,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let text = truncate_message(text);
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text: &text,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: &str, show_alert: bool) -> Result<()> {
        let params = json!({
            "callback_query_id": callback_query_id,
            "text": text,
            "show_alert": show_alert,
        });
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl WebhookApi for TelegramClient {
    async fn set_webhook(&self, url: &str) -> Result<()> {
        let _: bool = self.call("setWebhook", &json!({ "url": url })).await?;
        info!("Telegram webhook set to {}", url);
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        info!("Telegram webhook removed");
        Ok(())
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", &json!({})).await
    }
}
