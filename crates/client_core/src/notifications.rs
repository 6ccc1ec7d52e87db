use std::sync::Arc;

use shared::{domain::NotificationId, error::ApiError, protocol::Notification};
use tokio::sync::RwLock;

use crate::transport::ApiClient;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxState {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl InboxState {
    fn replace(&mut self, notifications: Vec<Notification>) {
        self.notifications = notifications;
        self.recount();
    }

    fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| !n.is_read).count();
    }
}

/// Notification list for the signed-in user. Local state only changes after
/// the server has confirmed the operation.
pub struct NotificationInbox {
    api: Arc<ApiClient>,
    state: RwLock<InboxState>,
}

impl NotificationInbox {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(InboxState::default()),
        }
    }

    pub async fn state(&self) -> InboxState {
        self.state.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread_count
    }

    pub async fn refresh(&self, unread_only: bool) -> Result<InboxState, ApiError> {
        let filter = unread_only.then_some(false);
        let notifications = self.api.list_notifications(filter).await?;
        let mut guard = self.state.write().await;
        guard.replace(notifications);
        Ok(guard.clone())
    }

    pub async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError> {
        self.api.mark_notification_read(id).await?;
        let mut guard = self.state.write().await;
        if let Some(notification) = guard.notifications.iter_mut().find(|n| n.id == id) {
            notification.is_read = true;
        }
        guard.recount();
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.api.mark_all_notifications_read().await?;
        let mut guard = self.state.write().await;
        for notification in &mut guard.notifications {
            notification.is_read = true;
        }
        guard.unread_count = 0;
        Ok(())
    }

    pub async fn delete(&self, id: NotificationId) -> Result<(), ApiError> {
        self.api.delete_notification(id).await?;
        let mut guard = self.state.write().await;
        guard.notifications.retain(|n| n.id != id);
        guard.recount();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
