// db/referraldb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::pointsmodel::TransactionType;
use crate::models::referralmodel::{ReferralCode, ReferralStats, ReferralUse};
use crate::service::error::ServiceError;
use crate::service::retry::retry_on_conflict;

const CODE_COLUMNS: &str = r#"
    id,
    code,
    owner_id,
    uses_count,
    max_uses,
    points_for_referrer,
    points_for_referee,
    is_active,
    expires_at,
    created_at
"#;

const USE_COLUMNS: &str = r#"
    id,
    referral_code_id,
    referred_user_id,
    referrer_transaction_id,
    referee_transaction_id,
    created_at
"#;

#[async_trait]
pub trait ReferralExt {
    async fn create_referral_code(
        &self,
        owner_id: Uuid,
        code: String,
        max_uses: i32,
        points_for_referrer: i64,
        points_for_referee: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ReferralCode, ServiceError>;

    async fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>, ServiceError>;

    async fn get_referral_codes_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ReferralCode>, ServiceError>;

    async fn deactivate_referral_code(&self, code_id: Uuid) -> Result<ReferralCode, ServiceError>;

    /// Apply a referral code for `referred_user_id`. One transaction covers
    /// the uses_count increment, both bonus awards and the ReferralUse row;
    /// either all four effects commit or none do.
    async fn use_referral_code(
        &self,
        code: &str,
        referred_user_id: Uuid,
    ) -> Result<ReferralUse, ServiceError>;

    async fn get_referral_uses(
        &self,
        referral_code_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReferralUse>, ServiceError>;

    async fn get_referral_stats(&self, owner_id: Uuid) -> Result<ReferralStats, ServiceError>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn create_referral_code(
        &self,
        owner_id: Uuid,
        code: String,
        max_uses: i32,
        points_for_referrer: i64,
        points_for_referee: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ReferralCode, ServiceError> {
        let referral_code = sqlx::query_as::<_, ReferralCode>(&format!(
            r#"
            INSERT INTO referral_codes
            (code, owner_id, max_uses, points_for_referrer, points_for_referee, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(owner_id)
        .bind(max_uses)
        .bind(points_for_referrer)
        .bind(points_for_referee)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(referral_code)
    }

    async fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>, ServiceError> {
        let referral_code = sqlx::query_as::<_, ReferralCode>(&format!(
            "SELECT {CODE_COLUMNS} FROM referral_codes WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referral_code)
    }

    async fn get_referral_codes_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ReferralCode>, ServiceError> {
        let codes = sqlx::query_as::<_, ReferralCode>(&format!(
            r#"
            SELECT {CODE_COLUMNS}
            FROM referral_codes
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codes)
    }

    async fn deactivate_referral_code(&self, code_id: Uuid) -> Result<ReferralCode, ServiceError> {
        let referral_code = sqlx::query_as::<_, ReferralCode>(&format!(
            r#"
            UPDATE referral_codes
            SET is_active = false
            WHERE id = $1
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(code_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(referral_code)
    }

    async fn use_referral_code(
        &self,
        code: &str,
        referred_user_id: Uuid,
    ) -> Result<ReferralUse, ServiceError> {
        retry_on_conflict(&self.retry_policy, "use_referral_code", || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;

            let referral_code = sqlx::query_as::<_, ReferralCode>(&format!(
                "SELECT {CODE_COLUMNS} FROM referral_codes WHERE code = $1 FOR UPDATE"
            ))
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::InvalidReferralCode("Unknown code".to_string()))?;

            if !referral_code.is_valid() {
                return Err(ServiceError::InvalidReferralCode(
                    "Code is inactive, exhausted or expired".to_string(),
                ));
            }
            if referral_code.owner_id == referred_user_id {
                return Err(ServiceError::InvalidReferralCode(
                    "Cannot use your own code".to_string(),
                ));
            }

            let already_used = sqlx::query(
                "SELECT 1 FROM referral_uses WHERE referral_code_id = $1 AND referred_user_id = $2",
            )
            .bind(referral_code.id)
            .bind(referred_user_id)
            .fetch_optional(&mut *tx)
            .await?;

            if already_used.is_some() {
                return Err(ServiceError::InvalidReferralCode(
                    "Code already used by this user".to_string(),
                ));
            }

            // Two balances move in this transaction; take their row locks in
            // ascending id order before either award touches them.
            self.lock_users_in_order(&mut tx, vec![referral_code.owner_id, referred_user_id])
                .await?;

            sqlx::query("UPDATE referral_codes SET uses_count = uses_count + 1 WHERE id = $1")
                .bind(referral_code.id)
                .execute(&mut *tx)
                .await?;

            let referrer_entry = self
                .apply_ledger_entry(
                    &mut tx,
                    referral_code.owner_id,
                    referral_code.points_for_referrer,
                    TransactionType::EarnedReferral,
                    &format!("Referral bonus: code {} used", referral_code.code),
                    None,
                    None,
                    None,
                    None,
                    None,
                )
                .await?;

            let referee_entry = self
                .apply_ledger_entry(
                    &mut tx,
                    referred_user_id,
                    referral_code.points_for_referee,
                    TransactionType::EarnedReferral,
                    &format!("Welcome bonus: joined with code {}", referral_code.code),
                    None,
                    None,
                    None,
                    None,
                    None,
                )
                .await?;

            let referral_use = sqlx::query_as::<_, ReferralUse>(&format!(
                r#"
                INSERT INTO referral_uses
                (referral_code_id, referred_user_id, referrer_transaction_id, referee_transaction_id)
                VALUES ($1, $2, $3, $4)
                RETURNING {USE_COLUMNS}
                "#
            ))
            .bind(referral_code.id)
            .bind(referred_user_id)
            .bind(referrer_entry.id)
            .bind(referee_entry.id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(referral_use)
        })
        .await
    }

    async fn get_referral_uses(
        &self,
        referral_code_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReferralUse>, ServiceError> {
        let uses = sqlx::query_as::<_, ReferralUse>(&format!(
            r#"
            SELECT {USE_COLUMNS}
            FROM referral_uses
            WHERE referral_code_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(referral_code_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(uses)
    }

    async fn get_referral_stats(&self, owner_id: Uuid) -> Result<ReferralStats, ServiceError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(ru.id) AS total_referrals,
                   COALESCE(SUM(pt.points), 0)::BIGINT AS total_points_earned
            FROM referral_codes rc
            JOIN referral_uses ru ON ru.referral_code_id = rc.id
            JOIN point_transactions pt ON pt.id = ru.referrer_transaction_id
            WHERE rc.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReferralStats {
            total_referrals: row.get::<i64, _>("total_referrals"),
            total_points_earned: row.get::<i64, _>("total_points_earned"),
        })
    }
}
