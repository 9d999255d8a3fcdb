pub mod error;
pub mod notification_service;
pub mod points_service;
pub mod redemption_service;
pub mod referral_service;
pub mod retry;
