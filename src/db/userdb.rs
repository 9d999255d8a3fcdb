// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::User;
use crate::service::error::ServiceError;

const USER_COLUMNS: &str = r#"
    id,
    name,
    username,
    email,
    role,
    points,
    green_score,
    items_listed_count,
    swaps_completed_count,
    email_notifications,
    push_notifications,
    mystery_box_enabled,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, ServiceError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    async fn increment_items_listed(&self, user_id: Uuid) -> Result<User, ServiceError>;

    async fn increment_swaps_completed(&self, user_id: Uuid) -> Result<User, ServiceError>;

    /// items_listed_count + swaps_completed_count * multiplier, rounded to
    /// two decimals and persisted.
    async fn recalculate_green_score(
        &self,
        user_id: Uuid,
        multiplier: f64,
    ) -> Result<User, ServiceError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn increment_items_listed(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET items_listed_count = items_listed_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

        Ok(user)
    }

    async fn increment_swaps_completed(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET swaps_completed_count = swaps_completed_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

        Ok(user)
    }

    async fn recalculate_green_score(
        &self,
        user_id: Uuid,
        multiplier: f64,
    ) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET green_score = ROUND((items_listed_count + swaps_completed_count * $2)::NUMERIC, 2)::DOUBLE PRECISION,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(multiplier)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

        Ok(user)
    }
}
