// service/points_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::PointsConfig,
    db::{db::DBClient, pointsdb::PointsLedgerExt, userdb::UserExt},
    models::itemmodel::Item,
    models::pointsmodel::{PointTransaction, PointsSettingType, TransactionType},
    service::{error::ServiceError, notification_service::NotificationService},
};

/// Config-driven earning operations. Collaborating workflows (item listing,
/// swap completion, badge engine) call these instead of the raw ledger so
/// award amounts stay centralized in the injected PointsConfig.
#[derive(Debug, Clone)]
pub struct PointsService {
    db_client: Arc<DBClient>,
    config: PointsConfig,
    notification_service: Arc<NotificationService>,
}

impl PointsService {
    pub fn new(
        db_client: Arc<DBClient>,
        config: PointsConfig,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            config,
            notification_service,
        }
    }

    pub fn config(&self) -> &PointsConfig {
        &self.config
    }

    /// Listing reward, plus the listed-items counter and green score. A
    /// disabled listing_reward setting turns this into a no-op.
    pub async fn award_listing_points(
        &self,
        user_id: Uuid,
        item: &Item,
    ) -> Result<Option<PointTransaction>, ServiceError> {
        let Some(points) = self.config.amount_for(PointsSettingType::ListingReward) else {
            return Ok(None);
        };

        let entry = self
            .db_client
            .award_points(
                user_id,
                points,
                TransactionType::EarnedListing,
                format!("Listed item: {}", item.title),
                Some(item.id),
                None,
                None,
                None,
            )
            .await?;

        // The award is committed past this point; statistics and notification
        // failures are logged, not returned, so callers never retry a
        // successful award.
        if let Err(err) = self.db_client.increment_items_listed(user_id).await {
            tracing::warn!(user_id = %user_id, error = %err, "items_listed_count update failed");
        }
        self.refresh_green_score(user_id).await;

        self.notify_entry(&entry).await;
        Ok(Some(entry))
    }

    pub async fn award_swap_points(
        &self,
        user_id: Uuid,
        swap_id: Uuid,
    ) -> Result<Option<PointTransaction>, ServiceError> {
        let Some(points) = self.config.amount_for(PointsSettingType::SwapReward) else {
            return Ok(None);
        };

        let entry = self
            .db_client
            .award_points(
                user_id,
                points,
                TransactionType::EarnedSwap,
                "Completed a swap".to_string(),
                None,
                Some(swap_id),
                None,
                None,
            )
            .await?;

        if let Err(err) = self.db_client.increment_swaps_completed(user_id).await {
            tracing::warn!(user_id = %user_id, error = %err, "swaps_completed_count update failed");
        }
        self.refresh_green_score(user_id).await;

        self.notify_entry(&entry).await;
        Ok(Some(entry))
    }

    pub async fn award_badge_bonus(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        badge_name: &str,
    ) -> Result<Option<PointTransaction>, ServiceError> {
        let Some(points) = self.config.amount_for(PointsSettingType::BadgeBonus) else {
            return Ok(None);
        };

        let entry = self
            .db_client
            .award_points(
                user_id,
                points,
                TransactionType::EarnedBadge,
                format!("Earned badge: {}", badge_name),
                None,
                None,
                Some(badge_id),
                None,
            )
            .await?;

        self.notify_entry(&entry).await;
        Ok(Some(entry))
    }

    /// Ad-hoc bonus with an explicit amount (promotions, daily login and the
    /// like). Unlike the setting-driven paths the caller names the amount.
    pub async fn award_bonus(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<PointTransaction, ServiceError> {
        let entry = self
            .db_client
            .award_points(
                user_id,
                points,
                TransactionType::EarnedBonus,
                description,
                None,
                None,
                None,
                None,
            )
            .await?;

        self.notify_entry(&entry).await;
        Ok(entry)
    }

    /// Admin surface only.
    pub async fn adjust(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        points: i64,
        description: String,
        admin_notes: Option<String>,
    ) -> Result<PointTransaction, ServiceError> {
        let entry = self
            .db_client
            .adjust_points(admin_id, user_id, points, description, admin_notes)
            .await?;

        self.notify_entry(&entry).await;
        Ok(entry)
    }

    /// Premium feature purchases spend points directly, outside the
    /// redemption workflow.
    pub async fn spend_on_premium(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<PointTransaction, ServiceError> {
        let entry = self
            .db_client
            .spend_points(
                user_id,
                points,
                TransactionType::SpentPremium,
                description,
                None,
                None,
                None,
            )
            .await?;

        self.notify_entry(&entry).await;
        Ok(entry)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        self.db_client.get_user_balance(user_id).await
    }

    /// Audit check: the live balance must equal the signed sum of the user's
    /// ledger entries. Returns both so callers can report drift.
    pub async fn reconcile(&self, user_id: Uuid) -> Result<(i64, i64), ServiceError> {
        let balance = self.db_client.get_user_balance(user_id).await?;
        let ledger_sum = self.db_client.sum_point_entries(user_id).await?;

        if balance != ledger_sum {
            tracing::error!(
                user_id = %user_id,
                balance,
                ledger_sum,
                "balance does not reconcile with ledger"
            );
        }

        Ok((balance, ledger_sum))
    }

    async fn refresh_green_score(&self, user_id: Uuid) {
        if let Err(err) = self
            .db_client
            .recalculate_green_score(user_id, self.config.green_score_multiplier)
            .await
        {
            tracing::warn!(user_id = %user_id, error = %err, "green score update failed");
        }
    }

    async fn notify_entry(&self, entry: &PointTransaction) {
        if let Err(err) = self.notification_service.notify_entry_created(entry).await {
            tracing::warn!(
                transaction_id = %entry.id,
                error = %err,
                "notification write failed after commit"
            );
        }
    }
}
