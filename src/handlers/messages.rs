use std::error::Error;
use std::sync::Arc;

use teloxide::prelude::*;

use crate::classifier::score_one;
use crate::handlers::{replies, Inbound, Moderator};
use crate::models::{ChatState, Mode};

/// Политика ответа, выводимая из состояния чата.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyPolicy {
    Inactive,
    ActiveAll,
    ActiveOnlyToxic { threshold: f64 },
}

impl From<&ChatState> for ReplyPolicy {
    fn from(state: &ChatState) -> Self {
        match (state.active, state.mode) {
            (false, _) => ReplyPolicy::Inactive,
            (true, Mode::All) => ReplyPolicy::ActiveAll,
            (true, Mode::OnlyToxic) => ReplyPolicy::ActiveOnlyToxic {
                threshold: state.threshold(),
            },
        }
    }
}

impl ReplyPolicy {
    /// Ответ на сообщение с данной оценкой; `None` значит молчать.
    pub fn reply_for(&self, probability: f64) -> Option<String> {
        match *self {
            ReplyPolicy::Inactive => None,
            ReplyPolicy::ActiveAll => Some(replies::toxicity(probability)),
            ReplyPolicy::ActiveOnlyToxic { threshold } if probability >= threshold => {
                Some(replies::toxic_warning(probability, threshold))
            }
            ReplyPolicy::ActiveOnlyToxic { .. } => None,
        }
    }
}

/// Обработка обычного текста. Состояние только читается; замок чата
/// держится до конца, чтобы команды и сообщения чата шли по очереди.
pub async fn route(moderator: &Moderator, chat_id: ChatId, text: &str) -> Option<String> {
    let state = moderator.store.lock(chat_id).await;

    let policy = ReplyPolicy::from(&*state);
    if policy == ReplyPolicy::Inactive {
        log::debug!("💤 Chat {} is inactive, message skipped", chat_id);
        return None;
    }

    let text = text.trim();
    if text.is_empty() {
        log::debug!("Empty message in chat {} skipped", chat_id);
        return None;
    }

    let probability =
        match score_one(moderator.classifier.as_ref(), text, moderator.classify_timeout).await {
            Ok(p) => p,
            Err(e) => {
                log::error!("❌ Classifier failed for chat {}: {:#}", chat_id, e);
                return Some(replies::model_error());
            }
        };
    drop(state);

    let reply = policy.reply_for(probability);
    if reply.is_none() {
        log::debug!(
            "🤫 Chat {}: score {:.3} below threshold, staying silent",
            chat_id,
            probability
        );
    }
    reply
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    moderator: Arc<Moderator>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    // Команды (в том числе чужие и неизвестные) сюда не относятся
    if text.starts_with('/') {
        log::debug!("Ignoring command {:?} in chat {}", text, msg.chat.id);
        return Ok(());
    }

    let chat_id = msg.chat.id;
    if let Some(reply) = moderator
        .handle_isolated(chat_id, Inbound::Text(text.to_string()))
        .await
    {
        bot.send_message(chat_id, reply).await?;
    }
    Ok(())
}
