use std::sync::Arc;

use uuid::Uuid;

use crate::dto::directory_dto::NotificationsResponse;
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::notification::Notification;
use crate::repositories::NotificationRepository;

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// The caller's notifications, newest first, with the unread count.
    pub async fn list(&self, actor: &Actor) -> Result<NotificationsResponse> {
        actor.ensure_active()?;
        let notifications = self.notifications.list_for_user(actor.user_id).await?;
        let unread_count = notifications.iter().filter(|n| !n.is_read).count();
        Ok(NotificationsResponse {
            unread_count,
            notifications,
        })
    }

    pub async fn mark_read(&self, actor: &Actor, notification_id: Uuid) -> Result<Notification> {
        actor.ensure_active()?;
        self.notifications
            .mark_read(notification_id, actor.user_id)
            .await?
            .ok_or_else(|| Error::not_found("Notification"))
    }
}
