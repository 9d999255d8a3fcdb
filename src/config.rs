// config.rs
use std::collections::HashMap;

use crate::models::pointsmodel::{PointsSetting, PointsSettingType};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(20);

        Config {
            database_url,
            max_connections,
        }
    }
}

/// Award amounts for the earning operations. Loaded from the admin-editable
/// `points_settings` table and passed into services explicitly; the earning
/// code never reads the table on its own.
#[derive(Debug, Clone)]
pub struct PointsConfig {
    amounts: HashMap<PointsSettingType, i64>,
    pub green_score_multiplier: f64,
    pub referral_max_uses: i32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        let mut amounts = HashMap::new();
        amounts.insert(PointsSettingType::ListingReward, 10);
        amounts.insert(PointsSettingType::SwapReward, 25);
        amounts.insert(PointsSettingType::ReferralReward, 50);
        amounts.insert(PointsSettingType::BadgeBonus, 50);
        amounts.insert(PointsSettingType::DailyLogin, 5);
        amounts.insert(PointsSettingType::ReviewBonus, 10);

        Self {
            amounts,
            green_score_multiplier: 1.5,
            referral_max_uses: 10,
        }
    }
}

impl PointsConfig {
    /// Build from the settings table. Inactive settings are left out, which
    /// turns the matching earning operation into a no-op.
    pub fn from_settings(settings: &[PointsSetting]) -> Self {
        let mut config = Self::default();
        config.amounts.clear();
        for setting in settings {
            if setting.is_active {
                config.amounts.insert(setting.setting_type, setting.points_value);
            }
        }
        config
    }

    pub fn amount_for(&self, setting_type: PointsSettingType) -> Option<i64> {
        self.amounts.get(&setting_type).copied().filter(|points| *points > 0)
    }

    /// Referrer bonus stamped onto newly generated referral codes.
    pub fn referrer_reward(&self) -> i64 {
        self.amount_for(PointsSettingType::ReferralReward).unwrap_or(50)
    }

    /// Referee bonus defaults to half the referrer bonus, matching the
    /// 50/25 split the platform launched with.
    pub fn referee_reward(&self) -> i64 {
        self.referrer_reward() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn setting(setting_type: PointsSettingType, points_value: i64, is_active: bool) -> PointsSetting {
        PointsSetting {
            id: Uuid::new_v4(),
            setting_type,
            points_value,
            description: String::new(),
            is_active,
            conditions: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn default_config_has_all_rewards() {
        let config = PointsConfig::default();
        assert_eq!(config.amount_for(PointsSettingType::ListingReward), Some(10));
        assert_eq!(config.amount_for(PointsSettingType::SwapReward), Some(25));
        assert_eq!(config.referrer_reward(), 50);
        assert_eq!(config.referee_reward(), 25);
    }

    #[test]
    fn inactive_settings_are_dropped() {
        let config = PointsConfig::from_settings(&[
            setting(PointsSettingType::ListingReward, 15, true),
            setting(PointsSettingType::SwapReward, 40, false),
        ]);
        assert_eq!(config.amount_for(PointsSettingType::ListingReward), Some(15));
        assert_eq!(config.amount_for(PointsSettingType::SwapReward), None);
        assert_eq!(config.amount_for(PointsSettingType::BadgeBonus), None);
    }

    #[test]
    fn zero_valued_setting_awards_nothing() {
        let config = PointsConfig::from_settings(&[setting(PointsSettingType::ListingReward, 0, true)]);
        assert_eq!(config.amount_for(PointsSettingType::ListingReward), None);
    }
}
