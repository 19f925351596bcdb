use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{Movie, NewMovie, NewUser, Rating, Snapshot, User};

/// Read contract the recommendation engine is built against. The engine
/// never sees SQL; it consumes one full snapshot per rebuild plus point
/// lookups for request validation.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn list_ratings(&self) -> Result<Vec<Rating>, AppError>;
    async fn list_movies(&self) -> Result<Vec<Movie>, AppError>;
    async fn get_movie(&self, movie_id: i64) -> Result<Option<Movie>, AppError>;
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError>;

    async fn snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(Snapshot {
            ratings: self.list_ratings().await?,
            movies: self.list_movies().await?,
        })
    }
}

pub struct MovieStore {
    pool: SqlitePool,
}

impl MovieStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(AppError::Database)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!("connected to database at {}", config.url);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                genre TEXT NOT NULL,
                release_year INTEGER NOT NULL,
                duration INTEGER NOT NULL,
                description TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                movie_id INTEGER NOT NULL REFERENCES movies(id),
                rating REAL NOT NULL,
                watched_at TEXT NOT NULL,
                UNIQUE(user_id, movie_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drops and recreates the whole schema. Used by the seeding binary.
    pub async fn reset(&self) -> Result<(), AppError> {
        for table in ["ratings", "movies", "users"] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(&self.pool)
                .await?;
        }
        self.migrate().await
    }

    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ?1 OR email = ?2")
                .bind(&new_user.username)
                .bind(&new_user.email)
                .fetch_optional(&self.pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::InvalidArgument(
                "username or email already in use".to_string(),
            ));
        }

        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3)")
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            created_at,
        })
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn create_movie(&self, new_movie: &NewMovie) -> Result<Movie, AppError> {
        let result = sqlx::query(
            "INSERT INTO movies (title, genre, release_year, duration, description)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&new_movie.title)
        .bind(&new_movie.genre)
        .bind(new_movie.release_year)
        .bind(new_movie.duration)
        .bind(&new_movie.description)
        .execute(&self.pool)
        .await?;

        Ok(Movie {
            id: result.last_insert_rowid(),
            title: new_movie.title.clone(),
            genre: new_movie.genre.clone(),
            release_year: new_movie.release_year,
            duration: new_movie.duration,
            description: new_movie.description.clone(),
        })
    }

    /// Creates or overwrites the user's rating for a movie, so the stored
    /// snapshot never carries duplicate (user, movie) pairs.
    pub async fn upsert_rating(
        &self,
        user_id: i64,
        movie_id: i64,
        rating: f32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO ratings (user_id, movie_id, rating, watched_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, movie_id)
             DO UPDATE SET rating = excluded.rating, watched_at = excluded.watched_at",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MovieStore {
    async fn list_ratings(&self) -> Result<Vec<Rating>, AppError> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT user_id, movie_id, rating, watched_at FROM ratings ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, AppError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, release_year, duration, description FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn get_movie(&self, movie_id: i64) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, release_year, duration, description FROM movies WHERE id = ?1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}
