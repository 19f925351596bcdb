pub mod features;
pub mod kmeans;
pub mod matrix;
pub mod similarity;

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::RecommendationConfig;
use crate::error::AppError;
use crate::models::{ClusterInfo, EngineStats, Movie, MovieRecommendation, Snapshot};

use features::MovieFeatures;
use kmeans::KMeans;
use matrix::RatingMatrix;

/// Keeps the weighted-average denominator away from zero for users whose
/// similarity row sums to nothing.
const WEIGHT_EPSILON: f32 = 1e-8;

/// Immutable snapshot engine. Every derived structure (rating matrix, user
/// similarity, movie features, cluster assignment) is computed once at
/// construction; new ratings or movies become visible only through a
/// rebuild that replaces the whole engine.
pub struct RecommenderEngine {
    matrix: RatingMatrix,
    user_similarity: Array2<f32>,
    features: MovieFeatures,
    clusters: Vec<usize>,
    n_clusters: usize,
    seed: u64,
    catalog: HashMap<i64, Movie>,
    item_similarity: OnceLock<Array2<f32>>,
}

impl RecommenderEngine {
    pub fn build(snapshot: Snapshot, config: &RecommendationConfig) -> Self {
        let Snapshot { ratings, movies } = snapshot;

        let matrix = RatingMatrix::build(&ratings, &movies);
        let user_similarity = similarity::user_similarity_matrix(&matrix);
        let features = MovieFeatures::build(&movies);
        let clusters = KMeans::new(config.n_clusters, config.seed).fit(features.standardized());
        let n_clusters = if matrix.n_movies() == 0 {
            0
        } else {
            config.n_clusters.clamp(1, matrix.n_movies())
        };
        let catalog: HashMap<i64, Movie> = movies.into_iter().map(|m| (m.id, m)).collect();

        info!(
            "recommendation engine built: {} users, {} movies, {} clusters",
            matrix.n_users(),
            matrix.n_movies(),
            n_clusters
        );

        Self {
            matrix,
            user_similarity,
            features,
            clusters,
            n_clusters,
            seed: config.seed,
            catalog,
            item_similarity: OnceLock::new(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            users: self.matrix.n_users(),
            movies: self.matrix.n_movies(),
            clusters: self.n_clusters,
            feature_columns: self.features.columns().len(),
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cosine similarity between two users' rating vectors.
    pub fn user_similarity(&self, user_a: i64, user_b: i64) -> Result<f32, AppError> {
        let a = self.user_position(user_a)?;
        let b = self.user_position(user_b)?;
        Ok(self.user_similarity[[a, b]])
    }

    /// Collaborative-filtering recommendations: every movie the user has not
    /// rated, ranked by the similarity-weighted average of all users'
    /// ratings for it.
    pub fn recommend_for_user(
        &self,
        user_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        let user = self.user_position(user_id)?;
        let candidates = self.unrated_movies(user);
        let ranked = self.rank_by_predicted_rating(user, candidates, n);

        Ok(ranked
            .into_iter()
            .map(|(movie_id, score)| self.hydrate(movie_id).with_predicted_rating(score))
            .collect())
    }

    /// Cluster-scoped variant: candidates come from the user's dominant
    /// cluster (or a seeded uniform pick when the user has no positive
    /// ratings), falling back to all unrated movies when the cluster has
    /// nothing left to offer.
    pub fn recommend_by_cluster(
        &self,
        user_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        let user = self.user_position(user_id)?;
        if self.n_clusters == 0 {
            return Ok(Vec::new());
        }

        let cluster = self
            .dominant_cluster(user)
            .unwrap_or_else(|| self.fallback_cluster(user_id));

        let unrated = self.unrated_movies(user);
        let mut candidates: Vec<usize> = unrated
            .iter()
            .copied()
            .filter(|&movie| self.clusters[movie] == cluster)
            .collect();
        if candidates.is_empty() {
            candidates = unrated;
        }

        let ranked = self.rank_by_predicted_rating(user, candidates, n);

        Ok(ranked
            .into_iter()
            .map(|(movie_id, score)| {
                self.hydrate(movie_id)
                    .with_predicted_rating(score)
                    .with_cluster(cluster)
            })
            .collect())
    }

    /// Item-based similarity over rating columns. Movies without a single
    /// rating are invisible here, both as query and as candidate.
    pub fn similar_movies(
        &self,
        movie_id: i64,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, AppError> {
        let movie = self
            .matrix
            .movie_position(movie_id)
            .ok_or_else(|| AppError::NotFound(format!("movie {} not found", movie_id)))?;
        if !self.has_ratings(movie) {
            return Err(AppError::NotFound(format!(
                "movie {} has no ratings",
                movie_id
            )));
        }

        let similarity = self.item_similarity();
        let mut scored: Vec<(i64, f32)> = (0..self.matrix.n_movies())
            .filter(|&other| other != movie && self.has_ratings(other))
            .map(|other| (self.matrix.movie_ids()[other], similarity[[movie, other]]))
            .collect();
        sort_ranked(&mut scored);
        scored.truncate(n);

        Ok(scored
            .into_iter()
            .map(|(id, score)| self.hydrate(id).with_similarity_score(score))
            .collect())
    }

    /// Popularity as the mean over each movie's full rating column. Unrated
    /// cells count as 0, so movies with thin coverage rank low no matter how
    /// well their few ratings score.
    pub fn popular_movies(&self, n: usize) -> Vec<MovieRecommendation> {
        let n_users = self.matrix.n_users();
        if n_users == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(i64, f32)> = (0..self.matrix.n_movies())
            .map(|movie| {
                let mean = self.matrix.movie_column(movie).sum() / n_users as f32;
                (self.matrix.movie_ids()[movie], mean)
            })
            .collect();
        sort_ranked(&mut scored);
        scored.truncate(n);

        scored
            .into_iter()
            .map(|(id, score)| self.hydrate(id).with_predicted_rating(score))
            .collect()
    }

    /// All movies carrying the given cluster label, ascending by id.
    pub fn movies_in_cluster(&self, cluster_id: usize) -> Result<Vec<Movie>, AppError> {
        if cluster_id >= self.n_clusters {
            return Err(AppError::NotFound(format!(
                "cluster {} does not exist",
                cluster_id
            )));
        }

        Ok(self
            .clusters
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == cluster_id)
            .map(|(movie, _)| self.catalog[&self.matrix.movie_ids()[movie]].clone())
            .collect())
    }

    /// Per-cluster overview: member count, mean of the observed (non-zero)
    /// ratings across members, and the union of member genres.
    pub fn cluster_summaries(&self) -> Vec<ClusterInfo> {
        (0..self.n_clusters)
            .map(|cluster_id| {
                let members: Vec<usize> = self
                    .clusters
                    .iter()
                    .enumerate()
                    .filter(|(_, &label)| label == cluster_id)
                    .map(|(movie, _)| movie)
                    .collect();

                let mut genres = BTreeSet::new();
                let mut total = 0.0f32;
                let mut observed = 0usize;
                for &movie in &members {
                    let record = &self.catalog[&self.matrix.movie_ids()[movie]];
                    genres.extend(record.genre_tokens());
                    for &value in self.matrix.movie_column(movie).iter() {
                        if value != 0.0 {
                            total += value;
                            observed += 1;
                        }
                    }
                }

                ClusterInfo {
                    cluster_id,
                    movie_count: members.len(),
                    average_rating: if observed > 0 {
                        total / observed as f32
                    } else {
                        0.0
                    },
                    genres: genres.into_iter().collect(),
                }
            })
            .collect()
    }

    fn user_position(&self, user_id: i64) -> Result<usize, AppError> {
        self.matrix.user_position(user_id).ok_or_else(|| {
            AppError::NotFound(format!("user {} has no rating history", user_id))
        })
    }

    fn unrated_movies(&self, user: usize) -> Vec<usize> {
        (0..self.matrix.n_movies())
            .filter(|&movie| self.matrix.value(user, movie) == 0.0)
            .collect()
    }

    /// Predicted rating for each candidate as the similarity-weighted
    /// average over every user's rating, the requester included with
    /// self-similarity 1. Results are sorted descending, ties broken by
    /// ascending movie id, and cut to n.
    fn rank_by_predicted_rating(
        &self,
        user: usize,
        candidates: Vec<usize>,
        n: usize,
    ) -> Vec<(i64, f32)> {
        let similarities = self.user_similarity.row(user);
        let weight_total: f32 = similarities.sum();

        let mut scored: Vec<(i64, f32)> = candidates
            .into_iter()
            .map(|movie| {
                let weighted: f32 = similarities
                    .iter()
                    .zip(self.matrix.movie_column(movie).iter())
                    .map(|(similarity, rating)| similarity * rating)
                    .sum();
                let predicted = weighted / (weight_total + WEIGHT_EPSILON);
                (self.matrix.movie_ids()[movie], predicted)
            })
            .collect();
        sort_ranked(&mut scored);
        scored.truncate(n);
        scored
    }

    /// Most frequent cluster among the user's positively rated movies; ties
    /// resolve to the smallest cluster index.
    fn dominant_cluster(&self, user: usize) -> Option<usize> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for movie in 0..self.matrix.n_movies() {
            if self.matrix.value(user, movie) > 0.0 {
                *counts.entry(self.clusters[movie]).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .max_by_key(|&(cluster, count)| (count, Reverse(cluster)))
            .map(|(cluster, _)| cluster)
    }

    /// Uniform cluster pick for users without positive ratings, seeded from
    /// the engine seed and the user id so the choice is stable for the
    /// lifetime of this engine.
    fn fallback_cluster(&self, user_id: i64) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        user_id.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());
        rng.gen_range(0..self.n_clusters)
    }

    fn has_ratings(&self, movie: usize) -> bool {
        self.matrix.movie_column(movie).iter().any(|&value| value != 0.0)
    }

    /// Item-item similarity is lazy: computed in full on first use, then
    /// reused until the engine is rebuilt.
    fn item_similarity(&self) -> &Array2<f32> {
        self.item_similarity
            .get_or_init(|| similarity::item_similarity_matrix(&self.matrix))
    }

    fn hydrate(&self, movie_id: i64) -> MovieRecommendation {
        MovieRecommendation::from_movie(&self.catalog[&movie_id])
    }
}

fn sort_ranked(scored: &mut [(i64, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}
