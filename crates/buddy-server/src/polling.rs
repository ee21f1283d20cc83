use buddy_agent::TelegramBot;
use buddy_client::telegram::TelegramUpdate;
use buddy_client::{TelegramClient, WebhookApi};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const LONG_POLL_TIMEOUT_SECS: u64 = 25;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Offset acknowledging every update in `updates`.
pub fn next_offset(current: Option<i64>, updates: &[TelegramUpdate]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}

/// Fetch updates with `getUpdates` and dispatch them until the task is aborted.
pub async fn run_long_polling(client: Arc<TelegramClient>, bot: Arc<TelegramBot>) {
    // Telegram refuses getUpdates while a webhook is registered
    if let Err(e) = client.delete_webhook().await {
        warn!("Could not remove webhook before polling: {}", e);
    }
    info!("🤖 Telegram bot started in polling mode");

    let mut offset = None;
    loop {
        match client.get_updates(offset, LONG_POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                offset = next_offset(offset, &updates);
                for update in updates {
                    let update_id = update.update_id;
                    if let Err(e) = bot.handle_update(update).await {
                        error!("Error handling update {}: {}", update_id, e);
                    }
                }
            }
            Err(e) => {
                warn!("getUpdates failed: {}, retrying in {:?}", e, RETRY_DELAY);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
