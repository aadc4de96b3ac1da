use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

mod bot_state;
mod classifier;
mod config;
mod handlers;
mod joke;
mod models;

use crate::bot_state::ChatStateStore;
use crate::classifier::HttpClassifier;
use crate::config::Config;
use crate::handlers::commands::verify_command_table;
use crate::handlers::{command_handler, message_handler, Command, Moderator};
use crate::joke::RzhunemoguJokes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Загружаем .env (и старый tg_bot/api_key.env) и инициализируем логирование
    dotenvy::dotenv().ok();
    dotenvy::from_filename("tg_bot/api_key.env").ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting toxicity bot...");

    let config = Config::from_env()?;
    verify_command_table().context("command table is inconsistent")?;

    let classifier = Arc::new(HttpClassifier::new(&config.classifier_url));
    log::info!(
        "✅ Classifier at {} (timeout {:?})",
        config.classifier_url,
        config.classifier_timeout
    );

    let jokes = Arc::new(
        RzhunemoguJokes::new(config.joke_url.clone()).context("failed to build joke client")?,
    );

    let moderator = Arc::new(Moderator::new(
        ChatStateStore::new(),
        classifier,
        jokes,
        config.classifier_timeout,
    ));

    let bot = Bot::new(config.token.expose());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("⚠️ Failed to register command menu: {}", e);
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![moderator])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
