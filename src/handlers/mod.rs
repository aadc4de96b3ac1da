pub mod commands;
pub mod messages;
pub mod replies;

use std::sync::Arc;
use std::time::Duration;

use teloxide::types::ChatId;

use crate::bot_state::ChatStateStore;
use crate::classifier::ToxicityClassifier;
use crate::joke::JokeSource;

pub use commands::{command_handler, Command};
pub use messages::message_handler;

/// Входящее обновление после разбора диспетчером.
#[derive(Debug, Clone)]
pub enum Inbound {
    Command(Command),
    Text(String),
}

/// Ядро бота: состояние чатов и внешние сервисы, без привязки к Telegram.
pub struct Moderator {
    pub store: ChatStateStore,
    pub classifier: Arc<dyn ToxicityClassifier>,
    pub jokes: Arc<dyn JokeSource>,
    pub classify_timeout: Duration,
}

impl Moderator {
    pub fn new(
        store: ChatStateStore,
        classifier: Arc<dyn ToxicityClassifier>,
        jokes: Arc<dyn JokeSource>,
        classify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            classifier,
            jokes,
            classify_timeout,
        }
    }

    /// Одно входящее обновление -> ноль или один ответ.
    pub async fn handle(&self, chat_id: ChatId, inbound: Inbound) -> Option<String> {
        match inbound {
            Inbound::Command(command) => Some(commands::execute(self, chat_id, command).await),
            Inbound::Text(text) => messages::route(self, chat_id, &text).await,
        }
    }

    /// То же, что `handle`, но в отдельной задаче: паника в обработке
    /// логируется и не роняет диспетчер.
    pub async fn handle_isolated(
        self: &Arc<Self>,
        chat_id: ChatId,
        inbound: Inbound,
    ) -> Option<String> {
        let moderator = Arc::clone(self);
        let summary = format!("{:?}", inbound);
        let task = tokio::spawn(async move { moderator.handle(chat_id, inbound).await });

        match task.await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("💥 Handler crashed for chat {} on {}: {}", chat_id, summary, e);
                None
            }
        }
    }
}
