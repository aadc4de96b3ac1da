use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::models::ChatState;

type ChatSlot = Arc<Mutex<ChatState>>;
type ChatMap = Arc<RwLock<HashMap<ChatId, ChatSlot>>>;

/// Реестр состояний чатов. У каждого чата свой мьютекс, так что
/// обработка одного чата не блокирует остальные.
#[derive(Clone, Default)]
pub struct ChatStateStore {
    chats: ChatMap,
}

impl ChatStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, chat_id: ChatId) -> ChatSlot {
        {
            let chats = self.chats.read().await;
            if let Some(slot) = chats.get(&chat_id) {
                return slot.clone();
            }
        }

        let mut chats = self.chats.write().await;
        chats
            .entry(chat_id)
            .or_insert_with(|| {
                log::debug!("🆕 New chat state for {}", chat_id);
                Arc::new(Mutex::new(ChatState::default()))
            })
            .clone()
    }

    /// Копия текущего состояния; создаёт состояние по умолчанию при первом обращении.
    pub async fn get_or_create(&self, chat_id: ChatId) -> ChatState {
        self.lock(chat_id).await.clone()
    }

    /// Эксклюзивный доступ к состоянию чата. Ожидающие получают доступ
    /// в порядке очереди.
    pub async fn lock(&self, chat_id: ChatId) -> OwnedMutexGuard<ChatState> {
        self.slot(chat_id).await.lock_owned().await
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }
}
