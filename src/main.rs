use anyhow::{Context, Result};
use buddy_agent::Category;
use buddy_config::AppConfig;
use buddy_conversation::{ConversationMemoryService, ConversationStore};
use buddy_server::Services;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "weightbuddy")]
#[command(about = "Telegram weight-loss coach with daily inspiration and AI chat", long_about = None)]
struct Cli {
    /// Config file; defaults to the first of config.yaml, config/config.yaml, /etc/weightbuddy/config.yaml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and Telegram bot
    Serve,

    /// Generate and send one inspiration message now
    SendInspiration {
        /// "motivation" or "check-in"; random when omitted
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Print a user's stored conversation
    History { user_id: i64 },

    /// Print a user's conversation summary, or replace it with --set
    Summary {
        user_id: i64,

        #[arg(long, value_name = "TEXT")]
        set: Option<String>,
    },

    /// Forget everything stored for a user
    Clear { user_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve => {
            config.validate()?;
            buddy_server::serve(config).await?;
        }
        Commands::SendInspiration { category } => {
            config.validate()?;
            send_inspiration(&config, category.as_deref()).await?;
        }
        Commands::History { user_id } => show_history(&memory_service(&config), user_id),
        Commands::Summary { user_id, set } => {
            let memory = memory_service(&config);
            if let Some(summary) = set {
                memory.set_conversation_summary(user_id, summary);
                info!("Summary updated for user {}", user_id);
            }
            println!("{}", memory.get_conversation_summary(user_id));
        }
        Commands::Clear { user_id } => {
            memory_service(&config).clear_user_conversation(user_id);
            println!("🧹 Cleared conversation memory for user {}", user_id);
        }
    }

    Ok(())
}

fn memory_service(config: &AppConfig) -> ConversationMemoryService {
    ConversationMemoryService::new(ConversationStore::new(&config.memory.data_dir))
}

async fn send_inspiration(config: &AppConfig, category: Option<&str>) -> Result<()> {
    let services = Services::from_config(config)?;

    let result = match category {
        Some(name) => {
            let category: Category = name.parse()?;
            services.inspiration.send_inspiration(category).await?
        }
        None => services.inspiration.send_daily_inspiration().await?,
    };

    println!("\n✨ Sent {} message:\n", result.category);
    println!("{}", result.message);
    Ok(())
}

fn show_history(memory: &ConversationMemoryService, user_id: i64) {
    let history = memory.get_user_conversation_history(user_id);
    if history.is_empty() {
        println!("No conversation history for user {}", user_id);
        return;
    }

    println!("\n📝 Summary: {}", memory.get_conversation_summary(user_id));
    println!("═══════════════════════════════════════");
    for message in &history {
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M"),
            message.role.prompt_label(),
            message.content
        );
    }
    println!("\n{} messages", history.len());
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
