use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub test_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub test_id: Option<Uuid>,
}

impl NewNotification {
    pub fn for_user(user_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
            test_id: None,
        }
    }

    pub fn for_test(user_id: Uuid, test_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
            test_id: Some(test_id),
        }
    }
}
