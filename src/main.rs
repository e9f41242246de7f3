use clap::{Parser, Subcommand};

mod application;
mod domain;
mod infrastructure;

use application::messaging::{
    LoggingMiddleware, MessageDispatcher, MiddlewareChain, RateLimitMiddleware,
};
use application::services::{ConversationEngine, CurrencyLedger, Reply};
use domain::traits::{Bot, Store};
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::telegram::TelegramAdapter;
use infrastructure::config::Config;
use infrastructure::database::Database;

#[derive(Parser)]
#[command(name = "kurs-bot")]
#[command(about = "A currency exchange-rate chat bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Version => {
            println!("kurs-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

fn init_config(path: &str) {
    match Config::default().save(path) {
        Ok(()) => println!("Wrote default config to {}", path),
        Err(e) => eprintln!("Failed to write config: {}", e),
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting kurs-bot: {}", config.bot.name);

    let db = match Database::new(&config.database.path) {
        Ok(db) => {
            tracing::info!("Database initialized at {}", config.database.path.display());
            db
        }
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");

    rt.block_on(async {
        let ledger = CurrencyLedger::new(db);
        let engine = ConversationEngine::new(ledger, &config.bot.reference_currency);

        // Seed admin identities from config.
        for chat_id in &config.admins.initial {
            match engine.ledger().register_admin(chat_id).await {
                Ok(()) => tracing::info!("Registered admin {}", chat_id),
                Err(e) => tracing::warn!("Failed to register admin {}: {}", chat_id, e),
            }
        }

        let dispatcher = MessageDispatcher::new(&config.bot.prefix, engine).with_chain(
            MiddlewareChain::new()
                .add(LoggingMiddleware)
                .add(RateLimitMiddleware::new(
                    config.security.rate_limit.max_requests,
                    config.security.rate_limit.window_seconds,
                )),
        );

        let token = token_override.or_else(|| {
            config
                .adapters
                .telegram
                .as_ref()
                .filter(|t| t.enabled)
                .and_then(|t| t.token.clone())
        });

        if let Some(token) = token {
            // Run Telegram bot
            let dispatcher = dispatcher.with_platform("telegram");
            let mut bot = TelegramAdapter::new(token);
            run_telegram_bot(&mut bot, &dispatcher).await;
        } else {
            // Run console bot (dev mode)
            let console_enabled = config
                .adapters
                .console
                .as_ref()
                .map(|c| c.enabled)
                .unwrap_or(true);
            if !console_enabled {
                tracing::error!("No Telegram token and the console adapter is disabled");
                return;
            }
            let dispatcher = dispatcher.with_platform("console");
            let bot = ConsoleAdapter::new();
            run_console_bot(&bot, &dispatcher).await;
        }
    });
}

async fn run_telegram_bot<S: Store>(bot: &mut TelegramAdapter, dispatcher: &MessageDispatcher<S>) {
    if let Err(e) = bot.fetch_bot_info().await {
        tracing::error!("Failed to fetch bot info: {}", e);
        return;
    }
    let info = bot.bot_info();
    tracing::info!("Bot started: @{} ({}, id {})", info.username, info.name, info.id);

    if let Err(e) = bot.register_commands().await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    let mut offset: i64 = 0;
    let timeout_seconds = 30;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                for update in &updates {
                    let Some(msg) = &update.message else { continue };
                    let chat_id = msg.chat.id.to_string();
                    let Some(text) = &msg.text else { continue };
                    if text.trim().is_empty() {
                        continue;
                    }
                    tracing::debug!(
                        "Update {}: message {} from chat {}",
                        update.update_id,
                        msg.message_id,
                        chat_id
                    );

                    let sender = msg.from.as_ref().map(|from| {
                        let mut user = domain::entities::User::new(from.id.to_string());
                        if let Some(username) = &from.username {
                            user = user.with_username(username);
                        }
                        if let Some(first) = &from.first_name {
                            user = user.with_name(first, from.last_name.as_deref());
                        }
                        user
                    });

                    match dispatcher.process(&chat_id, text, sender).await {
                        Ok(reply) => send_reply(bot, &chat_id, reply).await,
                        Err(e) => {
                            tracing::error!("Failed to handle message from {}: {}", chat_id, e)
                        }
                    }
                }

                if !updates.is_empty() {
                    offset = TelegramAdapter::get_next_offset(&updates);
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console_bot<S: Store>(bot: &ConsoleAdapter, dispatcher: &MessageDispatcher<S>) {
    tracing::info!("Console mode. Type /start to begin, Ctrl-D to exit.");

    loop {
        let Some(line) = bot.read_line("> ").await else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        match dispatcher.process("console", &line, None).await {
            Ok(reply) => send_reply(bot, "console", reply).await,
            Err(e) => tracing::error!("Failed to handle input: {}", e),
        }
    }
}

async fn send_reply<B: Bot>(bot: &B, chat_id: &str, reply: Reply) {
    let result = match reply.keyboard {
        Some(rows) => bot.send_with_keyboard(chat_id, &reply.text, rows).await,
        None => bot.send_message(chat_id, &reply.text).await,
    };

    if let Err(e) = result {
        tracing::error!("Failed to send message to {}: {}", chat_id, e);
    }
}
