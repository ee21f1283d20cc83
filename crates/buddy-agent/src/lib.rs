pub mod bot;
pub mod category;
pub mod chat;
pub mod inspiration;

pub use bot::{ButtonState, ButtonStateStore, Indicator, TelegramBot};
pub use category::Category;
pub use chat::{build_chat_prompt, is_slash_command, ChatService, APOLOGY_MESSAGE};
pub use inspiration::{InspirationResult, InspirationService};
