use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::dtos::NotificationResponseDto;
use crate::features::reports::repository::NotificationSink;

/// Inbox of lifecycle notifications. Rows are only ever created by the
/// lifecycle engine; recipients can read them and mark them read.
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Caller's notifications, newest first
    pub async fn my_notifications(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<NotificationResponseDto>> {
        let notifications = self.sink.notifications_for_user(user.user_id).await?;
        Ok(notifications.into_iter().map(Into::into).collect())
    }

    /// Someone else's notification reads as missing
    pub async fn mark_as_read(
        &self,
        user: &AuthenticatedUser,
        notification_id: Uuid,
    ) -> Result<NotificationResponseDto> {
        self.sink
            .mark_notification_read(notification_id, user.user_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }
}
