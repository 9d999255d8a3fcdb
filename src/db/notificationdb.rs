// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::notificationmodel::{Notification, NotificationType};
use crate::service::error::ServiceError;

const NOTIFICATION_COLUMNS: &str = r#"
    id,
    user_id,
    title,
    message,
    notification_type,
    is_read,
    related_item_id,
    related_swap_id,
    related_user_id,
    created_at
"#;

#[async_trait]
pub trait NotificationExt {
    async fn store_notification(
        &self,
        user_id: Uuid,
        title: String,
        message: String,
        notification_type: NotificationType,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        related_user_id: Option<Uuid>,
    ) -> Result<Notification, ServiceError>;

    async fn get_user_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError>;

    async fn mark_notification_read(&self, notification_id: Uuid)
        -> Result<Notification, ServiceError>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn store_notification(
        &self,
        user_id: Uuid,
        title: String,
        message: String,
        notification_type: NotificationType,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        related_user_id: Option<Uuid>,
    ) -> Result<Notification, ServiceError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
            (user_id, title, message, notification_type,
             related_item_id, related_swap_id, related_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(notification_type)
        .bind(related_item_id)
        .bind(related_swap_id)
        .bind(related_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_user_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        let notifications = if unread_only {
            sqlx::query_as::<_, Notification>(&format!(
                r#"
                SELECT {NOTIFICATION_COLUMNS}
                FROM notifications
                WHERE user_id = $1 AND is_read = false
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#
            ))
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(&format!(
                r#"
                SELECT {NOTIFICATION_COLUMNS}
                FROM notifications
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#
            ))
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, ServiceError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }
}
