// db/pointsdb.rs
use async_trait::async_trait;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::pointsmodel::{PointTransaction, TransactionType};
use crate::service::error::ServiceError;
use crate::service::retry::retry_on_conflict;

const TRANSACTION_COLUMNS: &str = r#"
    id,
    user_id,
    transaction_type,
    points,
    description,
    related_item_id,
    related_swap_id,
    related_badge_id,
    balance_before,
    balance_after,
    created_by,
    admin_notes,
    created_at
"#;

#[async_trait]
pub trait PointsLedgerExt {
    /// Credit `points` (> 0) to the user and append the matching ledger
    /// entry. Balance write and entry insert commit together or not at all.
    async fn award_points(
        &self,
        user_id: Uuid,
        points: i64,
        transaction_type: TransactionType,
        description: String,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        related_badge_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Result<PointTransaction, ServiceError>;

    /// Debit `points` (> 0) from the user. The balance check runs inside the
    /// same transaction as the mutation, so two concurrent spends against the
    /// same balance serialize and the loser sees InsufficientBalance.
    async fn spend_points(
        &self,
        user_id: Uuid,
        points: i64,
        transaction_type: TransactionType,
        description: String,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Result<PointTransaction, ServiceError>;

    /// Signed admin correction. Negative adjustments observe the same
    /// non-negative floor as spends.
    async fn adjust_points(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        points: i64,
        description: String,
        admin_notes: Option<String>,
    ) -> Result<PointTransaction, ServiceError>;

    /// Expiry sweep entry: debits like a spend but records kind `expired`.
    async fn expire_points(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<PointTransaction, ServiceError>;

    async fn get_user_balance(&self, user_id: Uuid) -> Result<i64, ServiceError>;

    async fn get_point_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<PointTransaction>, ServiceError>;

    async fn get_point_transactions(
        &self,
        user_id: Uuid,
        transaction_type: Option<TransactionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, ServiceError>;

    /// Audit read: the signed sum of a user's entries. Must always equal
    /// the live balance.
    async fn sum_point_entries(&self, user_id: Uuid) -> Result<i64, ServiceError>;
}

#[async_trait]
impl PointsLedgerExt for DBClient {
    async fn award_points(
        &self,
        user_id: Uuid,
        points: i64,
        transaction_type: TransactionType,
        description: String,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        related_badge_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Result<PointTransaction, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::Validation(
                "Award amount must be positive".to_string(),
            ));
        }

        retry_on_conflict(&self.retry_policy, "award_points", || {
            let description = description.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
                let entry = self
                    .apply_ledger_entry(
                        &mut tx,
                        user_id,
                        points,
                        transaction_type,
                        &description,
                        related_item_id,
                        related_swap_id,
                        related_badge_id,
                        created_by,
                        None,
                    )
                    .await?;
                tx.commit().await.map_err(ServiceError::Database)?;
                Ok(entry)
            }
        })
        .await
    }

    async fn spend_points(
        &self,
        user_id: Uuid,
        points: i64,
        transaction_type: TransactionType,
        description: String,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Result<PointTransaction, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::Validation(
                "Spend amount must be positive".to_string(),
            ));
        }

        retry_on_conflict(&self.retry_policy, "spend_points", || {
            let description = description.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
                // Entries are signed; spends are stored negated
                let entry = self
                    .apply_ledger_entry(
                        &mut tx,
                        user_id,
                        -points,
                        transaction_type,
                        &description,
                        related_item_id,
                        related_swap_id,
                        None,
                        created_by,
                        None,
                    )
                    .await?;
                tx.commit().await.map_err(ServiceError::Database)?;
                Ok(entry)
            }
        })
        .await
    }

    async fn adjust_points(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        points: i64,
        description: String,
        admin_notes: Option<String>,
    ) -> Result<PointTransaction, ServiceError> {
        if points == 0 {
            return Err(ServiceError::Validation(
                "Adjustment amount must be non-zero".to_string(),
            ));
        }

        retry_on_conflict(&self.retry_policy, "adjust_points", || {
            let description = description.clone();
            let admin_notes = admin_notes.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
                let entry = self
                    .apply_ledger_entry(
                        &mut tx,
                        user_id,
                        points,
                        TransactionType::AdminAdjustment,
                        &description,
                        None,
                        None,
                        None,
                        Some(admin_id),
                        admin_notes.as_deref(),
                    )
                    .await?;
                tx.commit().await.map_err(ServiceError::Database)?;
                Ok(entry)
            }
        })
        .await
    }

    async fn expire_points(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<PointTransaction, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::Validation(
                "Expiry amount must be positive".to_string(),
            ));
        }

        retry_on_conflict(&self.retry_policy, "expire_points", || {
            let description = description.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
                let entry = self
                    .apply_ledger_entry(
                        &mut tx,
                        user_id,
                        -points,
                        TransactionType::Expired,
                        &description,
                        None,
                        None,
                        None,
                        None,
                        None,
                    )
                    .await?;
                tx.commit().await.map_err(ServiceError::Database)?;
                Ok(entry)
            }
        })
        .await
    }

    async fn get_user_balance(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let row = sqlx::query("SELECT points FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        Ok(row.get::<i64, _>("points"))
    }

    async fn get_point_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<PointTransaction>, ServiceError> {
        let entry = sqlx::query_as::<_, PointTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM point_transactions WHERE id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn get_point_transactions(
        &self,
        user_id: Uuid,
        transaction_type: Option<TransactionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, ServiceError> {
        let entries = match transaction_type {
            Some(tx_type) => {
                sqlx::query_as::<_, PointTransaction>(&format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS}
                    FROM point_transactions
                    WHERE user_id = $1 AND transaction_type = $2
                    ORDER BY created_at DESC
                    LIMIT $3 OFFSET $4
                    "#
                ))
                .bind(user_id)
                .bind(tx_type)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PointTransaction>(&format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS}
                    FROM point_transactions
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
            }
        };

        Ok(entries)
    }

    async fn sum_point_entries(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(points), 0)::BIGINT AS total FROM point_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("total"))
    }
}

// Internal helpers shared by the ledger, redemption and referral paths.
// Every caller runs these inside an open transaction so the balance read,
// balance write and entry insert stay one atomic unit.
impl DBClient {
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn apply_ledger_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        points: i64,
        transaction_type: TransactionType,
        description: &str,
        related_item_id: Option<Uuid>,
        related_swap_id: Option<Uuid>,
        related_badge_id: Option<Uuid>,
        created_by: Option<Uuid>,
        admin_notes: Option<&str>,
    ) -> Result<PointTransaction, ServiceError> {
        // Row lock on the user serializes concurrent mutations of one balance
        let user = sqlx::query("SELECT points FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let balance_before = user.get::<i64, _>("points");
        let balance_after = balance_before + points;

        if balance_after < 0 {
            return Err(ServiceError::InsufficientBalance {
                required: -points,
                available: balance_before,
            });
        }

        sqlx::query("UPDATE users SET points = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(balance_after)
            .execute(&mut **tx)
            .await?;

        let entry = sqlx::query_as::<_, PointTransaction>(&format!(
            r#"
            INSERT INTO point_transactions
            (user_id, transaction_type, points, description,
             related_item_id, related_swap_id, related_badge_id,
             balance_before, balance_after, created_by, admin_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(transaction_type)
        .bind(points)
        .bind(description)
        .bind(related_item_id)
        .bind(related_swap_id)
        .bind(related_badge_id)
        .bind(balance_before)
        .bind(balance_after)
        .bind(created_by)
        .bind(admin_notes)
        .fetch_one(&mut **tx)
        .await?;

        Ok(entry)
    }

    /// Lock a set of user rows in ascending id order. Flows that touch two
    /// balances (referral, transfers) go through here first so crossing
    /// flows cannot deadlock.
    pub(crate) async fn lock_users_in_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut user_ids: Vec<Uuid>,
    ) -> Result<(), ServiceError> {
        user_ids.sort();
        user_ids.dedup();

        for user_id in user_ids {
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(ServiceError::UserNotFound(user_id))?;
        }

        Ok(())
    }
}
