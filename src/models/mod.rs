use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub duration: i32,
    pub description: String,
}

impl Movie {
    /// Splits the delimited genre field into trimmed tokens.
    pub fn genre_tokens(&self) -> Vec<String> {
        self.genre
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub duration: i32,
    pub description: String,
}

/// A single explicit rating. The (user, movie) pair is unique in storage;
/// re-rating overwrites the previous value.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: f32,
    pub watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateMovieRequest {
    pub movie_id: i64,
    pub rating: f32,
}

/// Full read snapshot the engine is built from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub ratings: Vec<Rating>,
    pub movies: Vec<Movie>,
}

/// A hydrated movie plus the score that put it in the result list. Which of
/// the optional fields is set depends on the query that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRecommendation {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub duration: i32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<usize>,
}

impl MovieRecommendation {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            release_year: movie.release_year,
            duration: movie.duration,
            description: movie.description.clone(),
            predicted_rating: None,
            similarity_score: None,
            cluster_id: None,
        }
    }

    pub fn with_predicted_rating(mut self, rating: f32) -> Self {
        self.predicted_rating = Some(rating);
        self
    }

    pub fn with_similarity_score(mut self, score: f32) -> Self {
        self.similarity_score = Some(score);
        self
    }

    pub fn with_cluster(mut self, cluster_id: usize) -> Self {
        self.cluster_id = Some(cluster_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_id: usize,
    pub movie_count: usize,
    pub average_rating: f32,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub users: usize,
    pub movies: usize,
    pub clusters: usize,
    pub feature_columns: usize,
}
