//! A console-backed `ChatGateway` adapter (§6, §11.1): no Telegram SDK per
//! the Non-goals, so outbound messages are logged and also buffered for
//! tests to assert against. A real bot integration only needs to swap this
//! adapter behind the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::ports::{ChatGateway, ChatMessage};

pub struct ConsoleChatGateway {
    sent: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ConsoleChatGateway {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn sent_messages(&self) -> Vec<ChatMessage> {
        self.sent.lock().await.clone()
    }
}

impl Default for ConsoleChatGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for ConsoleChatGateway {
    async fn send(&self, message: ChatMessage) -> anyhow::Result<()> {
        info!(text = %message.text, buttons = message.buttons.len(), "chat message");
        self.sent.lock().await.push(message);
        Ok(())
    }
}
