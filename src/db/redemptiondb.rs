// db/redemptiondb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::pointsmodel::{
    PointTransaction, PointsRedemption, RedemptionStatus, TransactionType,
};
use crate::service::error::ServiceError;
use crate::service::retry::retry_on_conflict;

const REDEMPTION_COLUMNS: &str = r#"
    id,
    user_id,
    item_id,
    points_spent,
    status,
    rejection_reason,
    reviewed_by,
    admin_notes,
    transaction_id,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait RedemptionExt {
    /// Spend the item's point value and create the pending redemption row as
    /// one atomic pair. An InsufficientBalance failure leaves no row behind.
    async fn request_redemption(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError>;

    /// pending -> approved. Records the approver.
    async fn approve_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        admin_notes: Option<String>,
    ) -> Result<PointsRedemption, ServiceError>;

    /// pending -> rejected. Issues a compensating award of the spent amount
    /// in the same transaction, so the user's balance is restored exactly.
    async fn reject_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        reason: String,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError>;

    /// approved -> fulfilled. Marks the item redeemed and unavailable.
    async fn fulfill_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
    ) -> Result<PointsRedemption, ServiceError>;

    async fn get_redemption(
        &self,
        redemption_id: Uuid,
    ) -> Result<Option<PointsRedemption>, ServiceError>;

    async fn get_user_redemptions(
        &self,
        user_id: Uuid,
        status: Option<RedemptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointsRedemption>, ServiceError>;
}

#[async_trait]
impl RedemptionExt for DBClient {
    async fn request_redemption(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError> {
        retry_on_conflict(&self.retry_policy, "request_redemption", || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;

            let item = sqlx::query_as::<_, crate::models::itemmodel::Item>(
                r#"
                SELECT id, owner_id, title, status, is_available, points_value,
                       allow_redemption, created_at, updated_at
                FROM items
                WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::ItemNotFound(item_id))?;

            if !item.is_redeemable() {
                return Err(ServiceError::ItemNotRedeemable(item_id));
            }
            if item.points_value <= 0 {
                return Err(ServiceError::Validation(
                    "Item has no point value set".to_string(),
                ));
            }

            let entry = self
                .apply_ledger_entry(
                    &mut tx,
                    user_id,
                    -item.points_value,
                    TransactionType::SpentRedemption,
                    &format!("Redeemed item: {}", item.title),
                    Some(item.id),
                    None,
                    None,
                    None,
                    None,
                )
                .await?;

            let redemption = sqlx::query_as::<_, PointsRedemption>(&format!(
                r#"
                INSERT INTO points_redemptions
                (user_id, item_id, points_spent, status, transaction_id)
                VALUES ($1, $2, $3, 'pending'::redemption_status, $4)
                RETURNING {REDEMPTION_COLUMNS}
                "#
            ))
            .bind(user_id)
            .bind(item_id)
            .bind(item.points_value)
            .bind(entry.id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await.map_err(ServiceError::Database)?;
            Ok((redemption, entry))
        })
        .await
    }

    async fn approve_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        admin_notes: Option<String>,
    ) -> Result<PointsRedemption, ServiceError> {
        retry_on_conflict(&self.retry_policy, "approve_redemption", || {
            let admin_notes = admin_notes.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;

                let current = self.lock_redemption(&mut tx, redemption_id).await?;
                ensure_transition(current.status, RedemptionStatus::Approved)?;

                let redemption = sqlx::query_as::<_, PointsRedemption>(&format!(
                    r#"
                    UPDATE points_redemptions
                    SET status = 'approved'::redemption_status,
                        reviewed_by = $2,
                        admin_notes = COALESCE($3, admin_notes),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {REDEMPTION_COLUMNS}
                    "#
                ))
                .bind(redemption_id)
                .bind(admin_id)
                .bind(admin_notes)
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await.map_err(ServiceError::Database)?;
                Ok(redemption)
            }
        })
        .await
    }

    async fn reject_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        reason: String,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError> {
        retry_on_conflict(&self.retry_policy, "reject_redemption", || {
            let reason = reason.clone();
            async move {
                let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;

                let current = self.lock_redemption(&mut tx, redemption_id).await?;
                ensure_transition(current.status, RedemptionStatus::Rejected)?;

                // Compensating award: rejection must not destroy user points
                let refund = self
                    .apply_ledger_entry(
                        &mut tx,
                        current.user_id,
                        current.points_spent,
                        TransactionType::AdminAdjustment,
                        &format!("Refund for rejected redemption {}", current.id),
                        Some(current.item_id),
                        None,
                        None,
                        Some(admin_id),
                        Some(&reason),
                    )
                    .await?;

                let redemption = sqlx::query_as::<_, PointsRedemption>(&format!(
                    r#"
                    UPDATE points_redemptions
                    SET status = 'rejected'::redemption_status,
                        rejection_reason = $2,
                        reviewed_by = $3,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {REDEMPTION_COLUMNS}
                    "#
                ))
                .bind(redemption_id)
                .bind(&reason)
                .bind(admin_id)
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await.map_err(ServiceError::Database)?;
                Ok((redemption, refund))
            }
        })
        .await
    }

    async fn fulfill_redemption(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
    ) -> Result<PointsRedemption, ServiceError> {
        retry_on_conflict(&self.retry_policy, "fulfill_redemption", || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;

            let current = self.lock_redemption(&mut tx, redemption_id).await?;
            ensure_transition(current.status, RedemptionStatus::Fulfilled)?;

            // The redeemed item leaves circulation with the fulfilment
            sqlx::query(
                r#"
                UPDATE items
                SET status = 'redeemed'::item_status,
                    is_available = false,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(current.item_id)
            .execute(&mut *tx)
            .await?;

            let redemption = sqlx::query_as::<_, PointsRedemption>(&format!(
                r#"
                UPDATE points_redemptions
                SET status = 'fulfilled'::redemption_status,
                    reviewed_by = COALESCE(reviewed_by, $2),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {REDEMPTION_COLUMNS}
                "#
            ))
            .bind(redemption_id)
            .bind(admin_id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(redemption)
        })
        .await
    }

    async fn get_redemption(
        &self,
        redemption_id: Uuid,
    ) -> Result<Option<PointsRedemption>, ServiceError> {
        let redemption = sqlx::query_as::<_, PointsRedemption>(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM points_redemptions WHERE id = $1"
        ))
        .bind(redemption_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(redemption)
    }

    async fn get_user_redemptions(
        &self,
        user_id: Uuid,
        status: Option<RedemptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointsRedemption>, ServiceError> {
        let redemptions = match status {
            Some(status) => {
                sqlx::query_as::<_, PointsRedemption>(&format!(
                    r#"
                    SELECT {REDEMPTION_COLUMNS}
                    FROM points_redemptions
                    WHERE user_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    LIMIT $3 OFFSET $4
                    "#
                ))
                .bind(user_id)
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PointsRedemption>(&format!(
                    r#"
                    SELECT {REDEMPTION_COLUMNS}
                    FROM points_redemptions
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

        Ok(redemptions)
    }
}

impl DBClient {
    async fn lock_redemption(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        redemption_id: Uuid,
    ) -> Result<PointsRedemption, ServiceError> {
        sqlx::query_as::<_, PointsRedemption>(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM points_redemptions WHERE id = $1 FOR UPDATE"
        ))
        .bind(redemption_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ServiceError::RedemptionNotFound(redemption_id))
    }
}

fn ensure_transition(
    from: RedemptionStatus,
    to: RedemptionStatus,
) -> Result<(), ServiceError> {
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidStateTransition { from, to });
    }
    Ok(())
}
