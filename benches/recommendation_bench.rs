use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reelrec::algorithms::RecommenderEngine;
use reelrec::config::RecommendationConfig;
use reelrec::models::{Movie, Rating, Snapshot};

const GENRES: [&str; 6] = [
    "Drama",
    "Action, Sci-Fi",
    "Comedy",
    "Horror, Mystery",
    "Romance, Drama",
    "Documentary",
];

fn synthetic_snapshot(n_users: i64, n_movies: i64) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(42);

    let movies: Vec<Movie> = (1..=n_movies)
        .map(|id| Movie {
            id,
            title: format!("Movie {}", id),
            genre: GENRES[(id as usize) % GENRES.len()].to_string(),
            release_year: 1970 + (id % 50) as i32,
            duration: 80 + (id % 120) as i32,
            description: format!("Synopsis for movie {}", id),
        })
        .collect();

    let mut ratings = Vec::new();
    for user_id in 1..=n_users {
        for movie_id in 1..=n_movies {
            if rng.gen_bool(0.2) {
                ratings.push(Rating {
                    user_id,
                    movie_id,
                    rating: rng.gen_range(1.0..=5.0),
                    watched_at: Utc::now(),
                });
            }
        }
    }

    Snapshot { ratings, movies }
}

fn bench_config() -> RecommendationConfig {
    RecommendationConfig {
        n_clusters: 5,
        seed: 42,
        default_results: 5,
        max_results: 20,
    }
}

fn benchmark_engine_build(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(100, 200);
    let config = bench_config();

    c.bench_function("engine_build", |b| {
        b.iter(|| {
            black_box(RecommenderEngine::build(snapshot.clone(), &config));
        });
    });
}

fn benchmark_neighborhood_recommendations(c: &mut Criterion) {
    let engine = RecommenderEngine::build(synthetic_snapshot(100, 200), &bench_config());

    c.bench_function("neighborhood_recommendations", |b| {
        b.iter(|| {
            black_box(engine.recommend_for_user(1, 10).unwrap());
        });
    });
}

fn benchmark_cluster_recommendations(c: &mut Criterion) {
    let engine = RecommenderEngine::build(synthetic_snapshot(100, 200), &bench_config());

    c.bench_function("cluster_recommendations", |b| {
        b.iter(|| {
            black_box(engine.recommend_by_cluster(1, 10).unwrap());
        });
    });
}

fn benchmark_similar_movies(c: &mut Criterion) {
    // first call pays the full item-similarity computation, later calls hit
    // the per-engine memo
    let engine = RecommenderEngine::build(synthetic_snapshot(100, 200), &bench_config());

    c.bench_function("similar_movies", |b| {
        b.iter(|| {
            black_box(engine.similar_movies(1, 10).unwrap());
        });
    });
}

fn benchmark_popular_movies(c: &mut Criterion) {
    let engine = RecommenderEngine::build(synthetic_snapshot(100, 200), &bench_config());

    c.bench_function("popular_movies", |b| {
        b.iter(|| {
            black_box(engine.popular_movies(10));
        });
    });
}

criterion_group!(
    benches,
    benchmark_engine_build,
    benchmark_neighborhood_recommendations,
    benchmark_cluster_recommendations,
    benchmark_similar_movies,
    benchmark_popular_movies
);
criterion_main!(benches);
