pub mod deepseek;
pub mod telegram;

pub use deepseek::DeepSeekClient;
pub use telegram::{truncate_message, BotApi, TelegramClient, WebhookApi, MAX_MESSAGE_LENGTH};
