use std::sync::Arc;

use homeworth_core::config::{AppConfig, ConfigError, LoadOptions, SessionBackend};
use homeworth_core::pricing::{LinearPriceModel, ModelLoadError, PricePredictor};
use homeworth_core::DialogueEngine;
use homeworth_db::{
    connect_with_settings, migrations, DbPool, InMemorySessionRepository, SessionRepository,
    SqlSessionRepository,
};
use thiserror::Error;
use tracing::info;

pub type SharedEngine = Arc<DialogueEngine<Arc<dyn PricePredictor>>>;

pub struct Application {
    pub config: AppConfig,
    pub engine: SharedEngine,
    pub sessions: Arc<dyn SessionRepository>,
    pub model_version: String,
    pub db_pool: Option<DbPool>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("price model could not be loaded: {0}")]
    Model(#[from] ModelLoadError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        session_backend = config.sessions.backend.as_str(),
        "starting application bootstrap"
    );

    let model = LinearPriceModel::load_or_baseline(config.model.path.as_deref())?;
    let model_version = model.version.clone();
    info!(
        event_name = "system.bootstrap.model_loaded",
        correlation_id = "bootstrap",
        model_version = %model_version,
        "price model loaded"
    );

    let predictor: Arc<dyn PricePredictor> = Arc::new(model);
    let engine =
        Arc::new(DialogueEngine::new(predictor).with_purchase_url(&config.dialogue.purchase_url));

    let (sessions, db_pool): (Arc<dyn SessionRepository>, Option<DbPool>) =
        match config.sessions.backend {
            SessionBackend::Memory => (Arc::new(InMemorySessionRepository::default()), None),
            SessionBackend::Sqlite => {
                let pool = connect_with_settings(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.timeout_secs,
                )
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
                info!(
                    event_name = "system.bootstrap.database_connected",
                    correlation_id = "bootstrap",
                    "database connection established"
                );

                migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
                info!(
                    event_name = "system.bootstrap.migrations_applied",
                    correlation_id = "bootstrap",
                    "database migrations applied"
                );

                (Arc::new(SqlSessionRepository::new(pool.clone())), Some(pool))
            }
        };

    Ok(Application { config, engine, sessions, model_version, db_pool })
}
