use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use reelrec::services::store::SnapshotSource;
use reelrec::utils::validation::{
    validate_new_movie, validate_new_user, validate_rating_value, validate_result_count,
};
use reelrec::{init_tracing, AppError, AppState, Config};
use reelrec::{
    ClusterInfo, EngineStats, Movie, MovieRecommendation, NewMovie, NewUser, RateMovieRequest,
    User,
};

#[derive(Debug, Deserialize)]
struct ResultCountQuery {
    n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }
}

fn resolve_result_count(state: &AppState, n: Option<usize>) -> Result<usize, AppError> {
    let n = n.unwrap_or(state.config.recommendation.default_results);
    validate_result_count(n, state.config.recommendation.max_results)?;
    Ok(n)
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "reelrec".to_string());
    status.insert("version".to_string(), "0.1.0".to_string());

    Json(ApiResponse::success(status))
}

async fn create_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    validate_new_user(&new_user)?;
    let user = state.store.create_user(&new_user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    match state.store.get_user(user_id).await? {
        Some(user) => Ok(Json(ApiResponse::success(user))),
        None => Err(AppError::NotFound(format!("user {} not found", user_id))),
    }
}

async fn create_movie(
    State(state): State<AppState>,
    Json(new_movie): Json<NewMovie>,
) -> Result<(StatusCode, Json<ApiResponse<Movie>>), AppError> {
    validate_new_movie(&new_movie)?;
    let movie = state.store.create_movie(&new_movie).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movie))))
}

async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<ApiResponse<Movie>>, AppError> {
    match state.store.get_movie(movie_id).await? {
        Some(movie) => Ok(Json(ApiResponse::success(movie))),
        None => Err(AppError::NotFound(format!("movie {} not found", movie_id))),
    }
}

async fn rate_movie(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<RateMovieRequest>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), AppError> {
    validate_rating_value(request.rating)?;

    if !state.store.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("user {} not found", user_id)));
    }
    if state.store.get_movie(request.movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "movie {} not found",
            request.movie_id
        )));
    }

    state
        .store
        .upsert_rating(user_id, request.movie_id, request.rating)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("movie rated".to_string())),
    ))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ResultCountQuery>,
) -> Result<Json<ApiResponse<Vec<MovieRecommendation>>>, AppError> {
    let n = resolve_result_count(&state, params.n)?;

    if !state.store.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("user {} not found", user_id)));
    }

    let recommendations = state
        .recommendation_service
        .recommend_for_user(user_id, n)
        .await?;
    Ok(Json(ApiResponse::success(recommendations)))
}

async fn get_cluster_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ResultCountQuery>,
) -> Result<Json<ApiResponse<Vec<MovieRecommendation>>>, AppError> {
    let n = resolve_result_count(&state, params.n)?;

    if !state.store.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("user {} not found", user_id)));
    }

    let recommendations = state
        .recommendation_service
        .recommend_by_cluster(user_id, n)
        .await?;
    Ok(Json(ApiResponse::success(recommendations)))
}

async fn get_similar_movies(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(params): Query<ResultCountQuery>,
) -> Result<Json<ApiResponse<Vec<MovieRecommendation>>>, AppError> {
    let n = resolve_result_count(&state, params.n)?;
    let similar = state
        .recommendation_service
        .similar_movies(movie_id, n)
        .await?;
    Ok(Json(ApiResponse::success(similar)))
}

async fn get_popular_movies(
    State(state): State<AppState>,
    Query(params): Query<ResultCountQuery>,
) -> Result<Json<ApiResponse<Vec<MovieRecommendation>>>, AppError> {
    let n = resolve_result_count(&state, params.n)?;
    let popular = state.recommendation_service.popular_movies(n).await;
    Ok(Json(ApiResponse::success(popular)))
}

async fn get_clusters(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ClusterInfo>>> {
    let summaries = state.recommendation_service.cluster_summaries().await;
    Json(ApiResponse::success(summaries))
}

async fn get_cluster_movies(
    State(state): State<AppState>,
    Path(cluster_id): Path<usize>,
) -> Result<Json<ApiResponse<Vec<Movie>>>, AppError> {
    let movies = state
        .recommendation_service
        .movies_in_cluster(cluster_id)
        .await?;
    Ok(Json(ApiResponse::success(movies)))
}

async fn rebuild_engine(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EngineStats>>, AppError> {
    let stats = state.recommendation_service.rebuild().await?;
    Ok(Json(ApiResponse::success(stats)))
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/users/:user_id", get(get_user))
        .route("/users/:user_id/ratings", post(rate_movie))
        .route("/movies", post(create_movie))
        .route("/movies/:movie_id", get(get_movie))
        .route("/movies/:movie_id/similar", get(get_similar_movies))
        .route("/recommendations/:user_id", get(get_recommendations))
        .route(
            "/cluster-recommendations/:user_id",
            get(get_cluster_recommendations),
        )
        .route("/popular-movies", get(get_popular_movies))
        .route("/clusters", get(get_clusters))
        .route("/clusters/:cluster_id/movies", get(get_cluster_movies))
        .route("/engine/rebuild", post(rebuild_engine))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().await;

    let config = if std::path::Path::new("config/default.toml").exists() {
        Config::from_file("config/default")?
    } else {
        Config::default()
    };
    info!("Starting ReelRec server with config: {:?}", config.server);

    let state = AppState::new(config.clone()).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
    info!("Server listening on {}", config.server.socket_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
