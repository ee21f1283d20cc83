use buddy_agent::{InspirationService, TelegramBot};
use buddy_client::WebhookApi;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<TelegramBot>,
    pub inspiration: Arc<InspirationService>,
    pub webhooks: Arc<dyn WebhookApi>,
    /// Public base URL the webhook is registered under, e.g. `https://bot.example.com`.
    pub webhook_base_url: Option<String>,
}
