use buddy_core::{BuddyError, CompletionClient, MessageSender, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::category::Category;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspirationResult {
    pub category: Category,
    pub message: String,
}

/// Generates a category message and posts it to the configured chat.
pub struct InspirationService {
    completion: Arc<dyn CompletionClient>,
    sender: Arc<dyn MessageSender>,
}

impl InspirationService {
    pub fn new(completion: Arc<dyn CompletionClient>, sender: Arc<dyn MessageSender>) -> Self {
        Self { completion, sender }
    }

    pub async fn send_daily_inspiration(&self) -> Result<InspirationResult> {
        self.send_inspiration(Category::random()).await
    }

    pub async fn send_inspiration(&self, category: Category) -> Result<InspirationResult> {
        info!("Sending {} inspiration", category);

        match self.generate_and_deliver(category).await {
            Ok(message) => Ok(InspirationResult { category, message }),
            Err(e) => {
                error!("Inspiration failed: {}", e);
                Err(with_context(e))
            }
        }
    }

    async fn generate_and_deliver(&self, category: Category) -> Result<String> {
        let message = self.completion.generate(category.prompt()).await?;
        self.sender.deliver(&message).await?;
        Ok(message)
    }
}

fn with_context(err: BuddyError) -> BuddyError {
    const PREFIX: &str = "Failed to send daily inspiration";
    match err {
        BuddyError::CompletionError(m) => BuddyError::CompletionError(format!("{}: {}", PREFIX, m)),
        BuddyError::DeliveryError(m) => BuddyError::DeliveryError(format!("{}: {}", PREFIX, m)),
        BuddyError::ConfigError(m) => BuddyError::ConfigError(format!("{}: {}", PREFIX, m)),
        other => BuddyError::Unknown(format!("{}: {}", PREFIX, other)),
    }
}
