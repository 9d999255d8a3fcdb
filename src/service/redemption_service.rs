// service/redemption_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, redemptiondb::RedemptionExt},
    models::pointsmodel::{PointTransaction, PointsRedemption, RedemptionStatus},
    service::{error::ServiceError, notification_service::NotificationService},
};

/// Redemption workflow: pending -> approved -> fulfilled, or
/// pending -> rejected. The atomic spend/refund mechanics live in
/// db/redemptiondb.rs; this layer orchestrates and reports.
#[derive(Debug, Clone)]
pub struct RedemptionService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl RedemptionService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn request(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError> {
        let (redemption, entry) = self.db_client.request_redemption(user_id, item_id).await?;

        tracing::info!(
            redemption_id = %redemption.id,
            user_id = %user_id,
            item_id = %item_id,
            points_spent = redemption.points_spent,
            "redemption requested"
        );

        self.notify_update(&redemption).await;

        Ok((redemption, entry))
    }

    pub async fn approve(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        admin_notes: Option<String>,
    ) -> Result<PointsRedemption, ServiceError> {
        let redemption = self
            .db_client
            .approve_redemption(admin_id, redemption_id, admin_notes)
            .await?;

        self.notify_update(&redemption).await;

        Ok(redemption)
    }

    pub async fn reject(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        reason: String,
    ) -> Result<(PointsRedemption, PointTransaction), ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Rejection reason is required".to_string(),
            ));
        }

        let (redemption, refund) = self
            .db_client
            .reject_redemption(admin_id, redemption_id, reason)
            .await?;

        tracing::info!(
            redemption_id = %redemption.id,
            refund_transaction_id = %refund.id,
            points_refunded = refund.points,
            "redemption rejected, spend reversed"
        );

        self.notify_update(&redemption).await;

        Ok((redemption, refund))
    }

    pub async fn fulfill(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
    ) -> Result<PointsRedemption, ServiceError> {
        let redemption = self
            .db_client
            .fulfill_redemption(admin_id, redemption_id)
            .await?;

        self.notify_update(&redemption).await;

        Ok(redemption)
    }

    pub async fn get(&self, redemption_id: Uuid) -> Result<PointsRedemption, ServiceError> {
        self.db_client
            .get_redemption(redemption_id)
            .await?
            .ok_or(ServiceError::RedemptionNotFound(redemption_id))
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<RedemptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointsRedemption>, ServiceError> {
        self.db_client
            .get_user_redemptions(user_id, status, limit, offset)
            .await
    }

    // Runs after the workflow change is committed; failures are logged, not
    // returned.
    async fn notify_update(&self, redemption: &PointsRedemption) {
        if let Err(err) = self
            .notification_service
            .notify_redemption_update(redemption)
            .await
        {
            tracing::warn!(
                redemption_id = %redemption.id,
                error = %err,
                "notification write failed after commit"
            );
        }
    }
}
