// db/settingsdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::config::PointsConfig;
use crate::models::pointsmodel::{PointsSetting, PointsSettingType};
use crate::service::error::ServiceError;

const SETTING_COLUMNS: &str = r#"
    id,
    setting_type,
    points_value,
    description,
    is_active,
    conditions,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait SettingsExt {
    async fn get_points_settings(&self) -> Result<Vec<PointsSetting>, ServiceError>;

    async fn upsert_points_setting(
        &self,
        setting_type: PointsSettingType,
        points_value: i64,
        description: String,
        is_active: bool,
    ) -> Result<PointsSetting, ServiceError>;

    /// Snapshot the settings table into the value the services are handed.
    async fn load_points_config(&self) -> Result<PointsConfig, ServiceError>;
}

#[async_trait]
impl SettingsExt for DBClient {
    async fn get_points_settings(&self) -> Result<Vec<PointsSetting>, ServiceError> {
        let settings = sqlx::query_as::<_, PointsSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM points_settings ORDER BY setting_type"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn upsert_points_setting(
        &self,
        setting_type: PointsSettingType,
        points_value: i64,
        description: String,
        is_active: bool,
    ) -> Result<PointsSetting, ServiceError> {
        let setting = sqlx::query_as::<_, PointsSetting>(&format!(
            r#"
            INSERT INTO points_settings (setting_type, points_value, description, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (setting_type) DO UPDATE
            SET points_value = EXCLUDED.points_value,
                description = EXCLUDED.description,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING {SETTING_COLUMNS}
            "#
        ))
        .bind(setting_type)
        .bind(points_value)
        .bind(description)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(setting)
    }

    async fn load_points_config(&self) -> Result<PointsConfig, ServiceError> {
        let settings = self.get_points_settings().await?;
        Ok(PointsConfig::from_settings(&settings))
    }
}
