// models/pointsmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "point_transaction_type", rename_all = "snake_case")]
pub enum TransactionType {
    EarnedListing,
    EarnedSwap,
    EarnedReferral,
    EarnedBadge,
    EarnedBonus,
    SpentRedemption,
    SpentPremium,
    AdminAdjustment,
    Expired,
}

impl TransactionType {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::EarnedListing => "earned_listing",
            TransactionType::EarnedSwap => "earned_swap",
            TransactionType::EarnedReferral => "earned_referral",
            TransactionType::EarnedBadge => "earned_badge",
            TransactionType::EarnedBonus => "earned_bonus",
            TransactionType::SpentRedemption => "spent_redemption",
            TransactionType::SpentPremium => "spent_premium",
            TransactionType::AdminAdjustment => "admin_adjustment",
            TransactionType::Expired => "expired",
        }
    }
}

/// Immutable ledger entry. One row per balance-changing event; never
/// updated or deleted after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    pub points: i64, // Negative for spending
    pub description: String,

    // Weak references: the referenced row may be deleted independently
    pub related_item_id: Option<Uuid>,
    pub related_swap_id: Option<Uuid>,
    pub related_badge_id: Option<Uuid>,

    // Balance snapshots taken inside the same transaction as the balance write
    pub balance_before: i64,
    pub balance_after: i64,

    pub created_by: Option<Uuid>,
    pub admin_notes: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
}

impl PointTransaction {
    pub fn is_earning(&self) -> bool {
        self.points > 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "redemption_status", rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RedemptionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Rejected => "rejected",
            RedemptionStatus::Fulfilled => "fulfilled",
        }
    }

    /// pending -> approved -> fulfilled, or pending -> rejected.
    pub fn can_transition_to(&self, to: RedemptionStatus) -> bool {
        matches!(
            (self, to),
            (RedemptionStatus::Pending, RedemptionStatus::Approved)
                | (RedemptionStatus::Pending, RedemptionStatus::Rejected)
                | (RedemptionStatus::Approved, RedemptionStatus::Fulfilled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RedemptionStatus::Rejected | RedemptionStatus::Fulfilled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointsRedemption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub points_spent: i64,
    pub status: RedemptionStatus,

    pub rejection_reason: Option<String>,
    // Admin who acted on the request, whichever way the decision went
    pub reviewed_by: Option<Uuid>,
    pub admin_notes: Option<String>,

    // The spend entry this redemption was created with (1:1)
    pub transaction_id: Uuid,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "points_setting_type", rename_all = "snake_case")]
pub enum PointsSettingType {
    ListingReward,
    SwapReward,
    ReferralReward,
    BadgeBonus,
    DailyLogin,
    ReviewBonus,
}

impl PointsSettingType {
    pub fn to_str(&self) -> &str {
        match self {
            PointsSettingType::ListingReward => "listing_reward",
            PointsSettingType::SwapReward => "swap_reward",
            PointsSettingType::ReferralReward => "referral_reward",
            PointsSettingType::BadgeBonus => "badge_bonus",
            PointsSettingType::DailyLogin => "daily_login",
            PointsSettingType::ReviewBonus => "review_bonus",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointsSetting {
    pub id: Uuid,
    pub setting_type: PointsSettingType,
    pub points_value: i64,
    pub description: String,
    pub is_active: bool,
    pub conditions: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
