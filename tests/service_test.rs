use std::sync::Arc;

use reelrec::config::{Config, DatabaseConfig};
use reelrec::error::AppError;
use reelrec::models::{NewMovie, NewUser};
use reelrec::services::recommendation::RecommendationService;
use reelrec::services::store::{MovieStore, SnapshotSource};

async fn memory_store() -> MovieStore {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // a single connection keeps every query on the same in-memory db
        max_connections: 1,
    };
    let store = MovieStore::connect(&config).await.unwrap();
    store.migrate().await.unwrap();
    store
}

fn new_movie(title: &str, genre: &str, year: i32, duration: i32) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        genre: genre.to_string(),
        release_year: year,
        duration,
        description: format!("Synopsis for {}", title),
    }
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{}@example.com", name),
    }
}

#[tokio::test]
async fn test_user_crud_and_duplicates() {
    let store = memory_store().await;

    let user = store.create_user(&new_user("movie_fan")).await.unwrap();
    assert!(user.id > 0);

    let fetched = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.username, "movie_fan");
    assert_eq!(fetched.email, "movie_fan@example.com");

    assert!(store.get_user(user.id + 1).await.unwrap().is_none());
    assert!(store.user_exists(user.id).await.unwrap());

    let duplicate = store.create_user(&new_user("movie_fan")).await;
    assert!(matches!(duplicate, Err(AppError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_movie_crud() {
    let store = memory_store().await;

    let movie = store
        .create_movie(&new_movie("The Matrix", "Action, Sci-Fi", 1999, 136))
        .await
        .unwrap();

    let fetched = store.get_movie(movie.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "The Matrix");
    assert_eq!(fetched.genre_tokens(), vec!["Action", "Sci-Fi"]);

    assert!(store.get_movie(movie.id + 1).await.unwrap().is_none());

    let all = store.list_movies().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_rating_upsert_keeps_last_write() {
    let store = memory_store().await;

    let user = store.create_user(&new_user("movie_fan")).await.unwrap();
    let movie = store
        .create_movie(&new_movie("Up", "Animation, Adventure", 2009, 96))
        .await
        .unwrap();

    store.upsert_rating(user.id, movie.id, 2.0).await.unwrap();
    store.upsert_rating(user.id, movie.id, 4.5).await.unwrap();

    let ratings = store.list_ratings().await.unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].user_id, user.id);
    assert_eq!(ratings[0].movie_id, movie.id);
    assert_eq!(ratings[0].rating, 4.5);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.ratings.len(), 1);
    assert_eq!(snapshot.movies.len(), 1);
}

async fn seeded_service() -> (Arc<MovieStore>, RecommendationService) {
    let store = Arc::new(memory_store().await);

    let alice = store.create_user(&new_user("alice")).await.unwrap();
    let bob = store.create_user(&new_user("bob")).await.unwrap();

    let drama = store
        .create_movie(&new_movie("First", "Drama", 1994, 142))
        .await
        .unwrap();
    let crime = store
        .create_movie(&new_movie("Second", "Drama, Crime", 1972, 175))
        .await
        .unwrap();
    let comedy = store
        .create_movie(&new_movie("Third", "Comedy", 2009, 100))
        .await
        .unwrap();

    store.upsert_rating(alice.id, drama.id, 5.0).await.unwrap();
    store.upsert_rating(alice.id, crime.id, 4.0).await.unwrap();
    store.upsert_rating(bob.id, drama.id, 4.5).await.unwrap();
    store.upsert_rating(bob.id, comedy.id, 3.0).await.unwrap();

    let mut config = Config::default();
    config.recommendation.n_clusters = 2;
    let service = RecommendationService::new(store.clone(), Arc::new(config))
        .await
        .unwrap();

    (store, service)
}

#[tokio::test]
async fn test_service_recommends_from_initial_snapshot() {
    let (_store, service) = seeded_service().await;

    let stats = service.stats().await;
    assert_eq!(stats.users, 2);
    assert_eq!(stats.movies, 3);
    assert_eq!(stats.clusters, 2);

    // alice has not seen the comedy yet
    let recommendations = service.recommend_for_user(1, 5).await.unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].title, "Third");

    let clustered = service.recommend_by_cluster(1, 5).await.unwrap();
    assert_eq!(clustered.len(), 1);
    assert!(clustered[0].cluster_id.is_some());

    let popular = service.popular_movies(5).await;
    assert_eq!(popular.len(), 3);

    let summaries = service.cluster_summaries().await;
    assert_eq!(summaries.len(), 2);
}

#[tokio::test]
async fn test_rebuild_picks_up_new_ratings() {
    let (store, service) = seeded_service().await;

    // a brand-new movie is invisible to the running engine
    let fresh = store
        .create_movie(&new_movie("Fourth", "Comedy", 2016, 108))
        .await
        .unwrap();
    let before: Vec<i64> = service
        .recommend_for_user(1, 10)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert!(!before.contains(&fresh.id));

    let stats = service.rebuild().await.unwrap();
    assert_eq!(stats.movies, 4);

    let after: Vec<i64> = service
        .recommend_for_user(1, 10)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert!(after.contains(&fresh.id));
}

#[tokio::test]
async fn test_service_user_similarity() {
    let (_store, service) = seeded_service().await;

    let similarity = service.user_similarity(1, 2).await.unwrap();
    assert!(similarity > 0.0 && similarity <= 1.0);

    assert!(matches!(
        service.user_similarity(1, 99).await,
        Err(AppError::NotFound(_))
    ));
}
