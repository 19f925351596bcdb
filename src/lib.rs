pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

use services::recommendation::RecommendationService;
use services::store::MovieStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<MovieStore>,
    pub recommendation_service: Arc<RecommendationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let store = Arc::new(MovieStore::connect(&config.database).await?);
        store.migrate().await?;

        let recommendation_service = Arc::new(
            RecommendationService::new(store.clone(), config.clone()).await?,
        );

        Ok(Self {
            config,
            store,
            recommendation_service,
        })
    }
}

pub async fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
