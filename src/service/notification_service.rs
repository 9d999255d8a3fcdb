// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::notificationmodel::NotificationType,
    models::pointsmodel::{PointTransaction, PointsRedemption, RedemptionStatus},
    models::referralmodel::ReferralUse,
    service::error::ServiceError,
};

/// Surfaces ledger events to the rest of the platform: one notification row
/// plus a structured log line per event. Delivery (email, push) is someone
/// else's job.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify_entry_created(
        &self,
        entry: &PointTransaction,
    ) -> Result<(), ServiceError> {
        let (notification_type, title) = if entry.is_earning() {
            (NotificationType::PointsEarned, "Points earned")
        } else {
            (NotificationType::PointsSpent, "Points spent")
        };

        tracing::info!(
            user_id = %entry.user_id,
            points = entry.points,
            transaction_type = entry.transaction_type.to_str(),
            balance_after = entry.balance_after,
            "ledger entry created"
        );

        self.db_client
            .store_notification(
                entry.user_id,
                title.to_string(),
                format!("{} ({} points)", entry.description, entry.points.abs()),
                notification_type,
                entry.related_item_id,
                entry.related_swap_id,
                None,
            )
            .await?;

        Ok(())
    }

    pub async fn notify_redemption_update(
        &self,
        redemption: &PointsRedemption,
    ) -> Result<(), ServiceError> {
        let (notification_type, message) = match redemption.status {
            RedemptionStatus::Pending => (
                NotificationType::RedemptionRequested,
                format!("Redemption requested for {} points", redemption.points_spent),
            ),
            RedemptionStatus::Approved => (
                NotificationType::RedemptionApproved,
                "Your redemption was approved".to_string(),
            ),
            RedemptionStatus::Rejected => (
                NotificationType::RedemptionRejected,
                format!(
                    "Your redemption was rejected and {} points were refunded",
                    redemption.points_spent
                ),
            ),
            RedemptionStatus::Fulfilled => (
                NotificationType::RedemptionFulfilled,
                "Your redeemed item is on its way".to_string(),
            ),
        };

        tracing::info!(
            redemption_id = %redemption.id,
            user_id = %redemption.user_id,
            status = redemption.status.to_str(),
            "redemption state changed"
        );

        self.db_client
            .store_notification(
                redemption.user_id,
                "Redemption update".to_string(),
                message,
                notification_type,
                Some(redemption.item_id),
                None,
                None,
            )
            .await?;

        Ok(())
    }

    pub async fn notify_referral_use(
        &self,
        referral_use: &ReferralUse,
        referrer_id: Uuid,
        referrer_points: i64,
        referee_points: i64,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            referral_use_id = %referral_use.id,
            referrer_id = %referrer_id,
            referred_user_id = %referral_use.referred_user_id,
            "referral code used"
        );

        self.db_client
            .store_notification(
                referrer_id,
                "Referral bonus".to_string(),
                format!("Someone joined with your code: +{} points", referrer_points),
                NotificationType::ReferralBonus,
                None,
                None,
                Some(referral_use.referred_user_id),
            )
            .await?;

        self.db_client
            .store_notification(
                referral_use.referred_user_id,
                "Welcome bonus".to_string(),
                format!("Thanks for joining: +{} points", referee_points),
                NotificationType::ReferralBonus,
                None,
                None,
                Some(referrer_id),
            )
            .await?;

        Ok(())
    }
}
