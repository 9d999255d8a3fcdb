// models/itemmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Approved,
    Rejected,
    Swapped,
    Redeemed,
}

impl ItemStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Swapped => "swapped",
            ItemStatus::Redeemed => "redeemed",
        }
    }
}

/// The slice of an item the points subsystem needs: redemption eligibility
/// and the fulfil-time status flip. Listing, search and images live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: ItemStatus,
    pub is_available: bool,

    // Redemption settings
    pub points_value: i64,
    pub allow_redemption: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_redeemable(&self) -> bool {
        self.allow_redemption && self.is_available
    }
}
