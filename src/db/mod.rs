pub mod db;
pub mod itemdb;
pub mod notificationdb;
pub mod pointsdb;
pub mod redemptiondb;
pub mod referraldb;
pub mod settingsdb;
pub mod userdb;
