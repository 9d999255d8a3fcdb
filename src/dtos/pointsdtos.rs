// dtos/pointsdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::pointsmodel::{
    PointTransaction, PointsRedemption, RedemptionStatus, TransactionType,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RedeemItemRequestDto {
    pub item_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdjustPointsRequestDto {
    pub user_id: Uuid,

    #[validate(range(min = -100000, max = 100000, message = "Adjustment out of range"))]
    pub points: i64,

    #[validate(length(min = 1, max = 500, message = "Description must be between 1 and 500 characters"))]
    pub description: String,

    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectRedemptionRequestDto {
    #[validate(length(min = 1, max = 1000, message = "Rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UseReferralRequestDto {
    #[validate(length(equal = 8, message = "Referral codes are 8 characters"))]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionHistoryQueryDto {
    pub transaction_type: Option<TransactionType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionHistoryQueryDto {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponseDto {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub points: i64,
    pub description: String,
    pub balance_before: i64,
    pub balance_after: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PointTransaction> for TransactionResponseDto {
    fn from(entry: PointTransaction) -> Self {
        Self {
            id: entry.id,
            transaction_type: entry.transaction_type,
            points: entry.points,
            description: entry.description,
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponseDto {
    pub user_id: Uuid,
    pub points: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedemptionResponseDto {
    pub id: Uuid,
    pub item_id: Uuid,
    pub points_spent: i64,
    pub status: RedemptionStatus,
    pub rejection_reason: Option<String>,
    pub transaction_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PointsRedemption> for RedemptionResponseDto {
    fn from(redemption: PointsRedemption) -> Self {
        Self {
            id: redemption.id,
            item_id: redemption.item_id,
            points_spent: redemption.points_spent,
            status: redemption.status,
            rejection_reason: redemption.rejection_reason,
            transaction_id: redemption.transaction_id,
            created_at: redemption.created_at,
            updated_at: redemption.updated_at,
        }
    }
}
