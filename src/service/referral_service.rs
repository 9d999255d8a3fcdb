// service/referral_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{
    config::PointsConfig,
    db::{db::DBClient, referraldb::ReferralExt},
    models::referralmodel::{ReferralCode, ReferralStats, ReferralUse},
    service::{error::ServiceError, notification_service::NotificationService},
};

pub fn generate_referral_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

pub fn generate_referral_link(base_url: &str, code: &str) -> String {
    format!("{}/register?ref={}", base_url, code)
}

#[derive(Debug, Clone)]
pub struct ReferralService {
    db_client: Arc<DBClient>,
    config: PointsConfig,
    notification_service: Arc<NotificationService>,
}

impl ReferralService {
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

    /// Mint a code for `owner_id`. Reward amounts are stamped onto the code
    /// row at creation, so later settings changes leave existing codes alone.
    pub async fn create_code(
        &self,
        owner_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ReferralCode, ServiceError> {
        let code = self
            .db_client
            .create_referral_code(
                owner_id,
                generate_referral_code(),
                self.config.referral_max_uses,
                self.config.referrer_reward(),
                self.config.referee_reward(),
                expires_at,
            )
            .await?;

        tracing::info!(owner_id = %owner_id, code = %code.code, "referral code created");
        Ok(code)
    }

    pub async fn use_code(
        &self,
        code: &str,
        referred_user_id: Uuid,
    ) -> Result<ReferralUse, ServiceError> {
        // Read once up front for the notification amounts; validity is
        // re-checked under lock inside use_referral_code.
        let referral_code = self
            .db_client
            .get_referral_code(code)
            .await?
            .ok_or_else(|| ServiceError::InvalidReferralCode("Unknown code".to_string()))?;

        let referral_use = self
            .db_client
            .use_referral_code(code, referred_user_id)
            .await?;

        // Awards are committed at this point; a failed notification write is
        // logged, not returned.
        if let Err(err) = self
            .notification_service
            .notify_referral_use(
                &referral_use,
                referral_code.owner_id,
                referral_code.points_for_referrer,
                referral_code.points_for_referee,
            )
            .await
        {
            tracing::warn!(
                referral_use_id = %referral_use.id,
                error = %err,
                "notification write failed after commit"
            );
        }

        Ok(referral_use)
    }

    pub async fn deactivate(&self, code_id: Uuid) -> Result<ReferralCode, ServiceError> {
        self.db_client.deactivate_referral_code(code_id).await
    }

    pub async fn codes_for_owner(&self, owner_id: Uuid) -> Result<Vec<ReferralCode>, ServiceError> {
        self.db_client.get_referral_codes_by_owner(owner_id).await
    }

    pub async fn stats(&self, owner_id: Uuid) -> Result<ReferralStats, ServiceError> {
        self.db_client.get_referral_stats(owner_id).await
    }
}
