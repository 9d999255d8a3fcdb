pub mod config;
pub mod db;
pub mod dtos;
pub mod models;
pub mod service;

use std::sync::Arc;

use config::{Config, PointsConfig};
pub use db::db::DBClient;
pub use service::error::ServiceError;
use sqlx::postgres::PgPoolOptions;

use service::{
    notification_service::NotificationService, points_service::PointsService,
    redemption_service::RedemptionService, referral_service::ReferralService,
};

/// Wired-up points subsystem. Embedding applications build one of these and
/// hand the services to their handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db_client: Arc<DBClient>,
    pub points_service: Arc<PointsService>,
    pub redemption_service: Arc<RedemptionService>,
    pub referral_service: Arc<ReferralService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db_client: DBClient, points_config: PointsConfig) -> Self {
        let db_client = Arc::new(db_client);

        let notification_service = Arc::new(NotificationService::new(db_client.clone()));
        let points_service = Arc::new(PointsService::new(
            db_client.clone(),
            points_config.clone(),
            notification_service.clone(),
        ));
        let redemption_service = Arc::new(RedemptionService::new(
            db_client.clone(),
            notification_service.clone(),
        ));
        let referral_service = Arc::new(ReferralService::new(
            db_client.clone(),
            points_config,
            notification_service.clone(),
        ));

        Self {
            db_client,
            points_service,
            redemption_service,
            referral_service,
            notification_service,
        }
    }

    /// Connect with the env-driven Config and the default award amounts.
    /// Callers that want table-driven amounts load a PointsConfig through
    /// SettingsExt::load_points_config first and use `new`.
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "database pool ready");

        Ok(Self::new(DBClient::new(pool), PointsConfig::default()))
    }
}
