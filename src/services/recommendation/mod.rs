use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::algorithms::RecommenderEngine;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{ClusterInfo, EngineStats, Movie, MovieRecommendation};
use crate::services::store::SnapshotSource;

/// Owns the current engine instance and rebuilds it on demand. Queries
/// clone the inner Arc, so a rebuild swaps the reference without blocking
/// readers that are mid-computation on the previous engine.
pub struct RecommendationService {
    store: Arc<dyn SnapshotSource>,
    config: Arc<Config>,
    engine: RwLock<Arc<RecommenderEngine>>,
}

impl RecommendationService {
    pub async fn new(
        store: Arc<dyn SnapshotSource>,
        config: Arc<Config>,
    ) -> Result<Self, AppError> {
        let snapshot = store.snapshot().await?;
        let engine = Arc::new(RecommenderEngine::build(snapshot, &config.recommendation));

        Ok(Self {
            store,
            config,
            engine: RwLock::new(engine),
        })
    }

    /// Builds a replacement engine from a fresh snapshot and swaps it in.
    pub async fn rebuild(&self) -> Result<EngineStats, AppError> {
        let snapshot = self.store.snapshot().await?;
        let engine = Arc::new(RecommenderEngine::build(
            snapshot,
            &self.config.recommendation,
        ));
        let stats = engine.stats();

        *self.engine.write().await = engine;
        info!(
            "recommendation engine rebuilt: {} users, {} movies, {} clusters",
            stats.users, stats.movies, stats.clusters
        );

        Ok(stats)
    }

    async fn engine(&self) -> Arc<RecommenderEngine> {
        self.engine.read().await.clone()
    }

    pub async fn stats(&self) -> EngineStats {
        self.engine().await.stats()
    }

    pub async fn user_similarity(&self, user_a: i64, user_b: i64) -> Result<f32, AppError> {
        self.engine().await.user_similarity(user_a, user_b)
    }

    pub async fn recommend_for_user(
        &self,
        user_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        self.engine().await.recommend_for_user(user_id, n)
    }

    pub async fn recommend_by_cluster(
        &self,
        user_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        self.engine().await.recommend_by_cluster(user_id, n)
    }

    pub async fn similar_movies(
        &self,
        movie_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        self.engine().await.similar_movies(movie_id, n)
    }

    pub async fn popular_movies(&self, n: usize) -> Vec<MovieRecommendation> {
        self.engine().await.popular_movies(n)
    }

    pub async fn movies_in_cluster(&self, cluster_id: usize) -> Result<Vec<Movie>, AppError> {
        self.engine().await.movies_in_cluster(cluster_id)
    }

    pub async fn cluster_summaries(&self) -> Vec<ClusterInfo> {
        self.engine().await.cluster_summaries()
    }
}
