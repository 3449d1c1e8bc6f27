use std::sync::Arc;

use crate::auth::repo::UserStore;
use crate::config::AppConfig;
use crate::db::{self, PgStore};
use crate::foods::repo::FoodStore;
use crate::forms::SubmitGate;
use crate::profile::repo::ProfileStore;
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub foods: Arc<dyn FoodStore>,
    pub storage: Arc<dyn StorageClient>,
    pub gate: SubmitGate,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config.database_url).await?;
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        // S3 / MinIO
        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(config, PgStore::new(pool), storage))
    }

    pub fn from_parts(config: Arc<AppConfig>, pg: PgStore, storage: Arc<dyn StorageClient>) -> Self {
        let pg = Arc::new(pg);
        Self {
            config,
            users: pg.clone(),
            profiles: pg.clone(),
            foods: pg,
            storage,
            gate: SubmitGate::default(),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::TestEnv::new().state
    }
}
