// db/itemdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::itemmodel::{Item, ItemStatus};
use crate::service::error::ServiceError;

const ITEM_COLUMNS: &str = r#"
    id,
    owner_id,
    title,
    status,
    is_available,
    points_value,
    allow_redemption,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait ItemExt {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, ServiceError>;

    async fn update_item_status(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        is_available: bool,
    ) -> Result<Item, ServiceError>;
}

#[async_trait]
impl ItemExt for DBClient {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, ServiceError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn update_item_status(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        is_available: bool,
    ) -> Result<Item, ServiceError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET status = $2, is_available = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(status)
        .bind(is_available)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::ItemNotFound(item_id))?;

        Ok(item)
    }
}
