pub mod error;
pub mod handlers;
pub mod middleware;
pub mod polling;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use buddy_agent::{ChatService, InspirationService, TelegramBot};
use buddy_client::{DeepSeekClient, TelegramClient};
use buddy_config::AppConfig;
use buddy_conversation::{ConversationMemoryService, ConversationStore};
use buddy_core::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Every long-lived service, wired from configuration.
pub struct Services {
    pub memory: Arc<ConversationMemoryService>,
    pub telegram: Arc<TelegramClient>,
    pub chat: Arc<ChatService>,
    pub bot: Arc<TelegramBot>,
    pub inspiration: Arc<InspirationService>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let completion = Arc::new(DeepSeekClient::new(config.deepseek.clone())?);
        let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
        let memory = Arc::new(ConversationMemoryService::new(ConversationStore::new(
            &config.memory.data_dir,
        )));

        let chat = Arc::new(ChatService::new(completion.clone(), memory.clone()));
        let bot = Arc::new(TelegramBot::new(telegram.clone(), chat.clone()));
        let inspiration = Arc::new(InspirationService::new(completion, telegram.clone()));

        Ok(Self {
            memory,
            telegram,
            chat,
            bot,
            inspiration,
        })
    }

    pub fn app_state(&self, config: &AppConfig) -> AppState {
        AppState {
            bot: self.bot.clone(),
            inspiration: self.inspiration.clone(),
            webhooks: self.telegram.clone(),
            webhook_base_url: config.server.webhook_base_url.clone(),
        }
    }
}

/// Run the HTTP server until Ctrl-C. Outside production the bot also long-polls.
pub async fn serve(config: AppConfig) -> Result<()> {
    let services = Services::from_config(&config)?;
    services.memory.initialize_conversation_memory();

    let polling = if config.is_production() {
        info!("🤖 Telegram bot ready for webhook setup");
        None
    } else {
        Some(tokio::spawn(polling::run_long_polling(
            services.telegram.clone(),
            services.bot.clone(),
        )))
    };

    let app = create_router(services.app_state(&config));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🚀 WeightBuddy server running on port {}", config.server.port);
    info!("📱 Health check: http://localhost:{}/health", config.server.port);
    info!("🌍 Environment: {}", config.server.environment);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = polling {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
