//! Notification sink collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use thiserror::Error;
use tokio::sync::RwLock;

/// Error from a notification sink.
#[derive(Debug, Error)]
#[error("notification sink error: {0}")]
pub struct NotifyError(pub String);

/// Records user-facing messages.
///
/// Settlement calls this fire-and-forget: a sink failure is logged and
/// never fails the payment.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a message to the user.
    async fn send(&self, user_id: UserId, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifyState {
    messages: Vec<(UserId, String)>,
    fail_on_send: bool,
}

/// In-memory notification sink for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    state: Arc<RwLock<InMemoryNotifyState>>,
}

impl InMemoryNotificationSink {
    /// Creates a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail on subsequent send calls.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.write().await.fail_on_send = fail;
    }

    /// Returns the number of delivered messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }

    /// Returns the messages delivered to a user.
    pub async fn messages_for(&self, user_id: UserId) -> Vec<String> {
        self.state
            .read()
            .await
            .messages
            .iter()
            .filter(|(recipient, _)| *recipient == user_id)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn send(&self, user_id: UserId, message: &str) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        if state.fail_on_send {
            return Err(NotifyError("sink unavailable".to_string()));
        }
        state.messages.push((user_id, message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_messages_per_user() {
        let sink = InMemoryNotificationSink::new();
        let user_id = UserId::new();

        sink.send(user_id, "first").await.unwrap();
        sink.send(UserId::new(), "other").await.unwrap();

        assert_eq!(sink.message_count().await, 2);
        assert_eq!(sink.messages_for(user_id).await, vec!["first"]);
    }

    #[tokio::test]
    async fn fails_when_configured() {
        let sink = InMemoryNotificationSink::new();
        sink.set_fail_on_send(true).await;

        let result = sink.send(UserId::new(), "lost").await;
        assert!(result.is_err());
        assert_eq!(sink.message_count().await, 0);
    }
}
