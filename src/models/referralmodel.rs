// models/referralmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct ReferralCode {
    pub id: Uuid,
    pub code: String,
    pub owner_id: Uuid,
    pub uses_count: i32,
    pub max_uses: i32,

    pub points_for_referrer: i64,
    pub points_for_referee: i64,

    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ReferralCode {
    /// Valid = active, under its use cap and not past its expiry.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.uses_count >= self.max_uses {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at < now {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct ReferralUse {
    pub id: Uuid,
    pub referral_code_id: Uuid,
    pub referred_user_id: Uuid,

    // The two award entries this use was created with
    pub referrer_transaction_id: Uuid,
    pub referee_transaction_id: Uuid,

    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReferralStats {
    pub total_referrals: i64,
    pub total_points_earned: i64,
}
