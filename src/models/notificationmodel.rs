// models/notificationmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
pub enum NotificationType {
    PointsEarned,
    PointsSpent,
    RedemptionRequested,
    RedemptionApproved,
    RedemptionRejected,
    RedemptionFulfilled,
    ReferralBonus,
    BadgeEarned,
    General,
}

impl NotificationType {
    pub fn to_str(&self) -> &str {
        match self {
            NotificationType::PointsEarned => "points_earned",
            NotificationType::PointsSpent => "points_spent",
            NotificationType::RedemptionRequested => "redemption_requested",
            NotificationType::RedemptionApproved => "redemption_approved",
            NotificationType::RedemptionRejected => "redemption_rejected",
            NotificationType::RedemptionFulfilled => "redemption_fulfilled",
            NotificationType::ReferralBonus => "referral_bonus",
            NotificationType::BadgeEarned => "badge_earned",
            NotificationType::General => "general",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,

    pub related_item_id: Option<Uuid>,
    pub related_swap_id: Option<Uuid>,
    pub related_user_id: Option<Uuid>,

    pub created_at: Option<DateTime<Utc>>,
}
