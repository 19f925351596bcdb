use ndarray::Array2;
use rayon::prelude::*;

use super::matrix::RatingMatrix;
use crate::utils::cosine_similarity;

/// Pairwise cosine similarity between user rating rows. Symmetric with a
/// unit diagonal; a user with no ratings has similarity 0 to everyone else.
pub fn user_similarity_matrix(matrix: &RatingMatrix) -> Array2<f32> {
    let rows: Vec<Vec<f32>> = (0..matrix.n_users())
        .map(|position| matrix.user_row(position).to_vec())
        .collect();
    pairwise_cosine(&rows)
}

/// Pairwise cosine similarity between movie rating columns.
pub fn item_similarity_matrix(matrix: &RatingMatrix) -> Array2<f32> {
    let columns: Vec<Vec<f32>> = (0..matrix.n_movies())
        .map(|position| matrix.movie_column(position).to_vec())
        .collect();
    pairwise_cosine(&columns)
}

fn pairwise_cosine(vectors: &[Vec<f32>]) -> Array2<f32> {
    let n = vectors.len();
    let flat: Vec<f32> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (0..n).map(move |j| {
                if i == j {
                    1.0
                } else {
                    cosine_similarity(&vectors[i], &vectors[j])
                }
            })
        })
        .collect();

    Array2::from_shape_vec((n, n), flat).expect("similarity matrix is n by n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Movie, Rating};
    use chrono::Utc;

    fn movie(id: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            genre: "Drama".to_string(),
            release_year: 2000,
            duration: 120,
            description: "A test movie description".to_string(),
        }
    }

    fn rating(user_id: i64, movie_id: i64, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            watched_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_similarity_is_symmetric_with_unit_diagonal() {
        let movies = vec![movie(1), movie(2)];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 1.0),
            rating(2, 1, 4.0),
            rating(2, 2, 2.0),
        ];
        let matrix = RatingMatrix::build(&ratings, &movies);

        let similarity = user_similarity_matrix(&matrix);

        assert_eq!(similarity[[0, 0]], 1.0);
        assert_eq!(similarity[[1, 1]], 1.0);
        assert!((similarity[[0, 1]] - similarity[[1, 0]]).abs() < 1e-6);
        assert!(similarity[[0, 1]] > 0.9);
    }

    #[test]
    fn test_item_similarity_zero_for_unrated_column() {
        let movies = vec![movie(1), movie(2)];
        let ratings = vec![rating(1, 1, 5.0)];
        let matrix = RatingMatrix::build(&ratings, &movies);

        let similarity = item_similarity_matrix(&matrix);

        // movie 2 has no ratings, so its off-diagonal similarity is 0
        assert_eq!(similarity[[0, 1]], 0.0);
        assert_eq!(similarity[[1, 0]], 0.0);
    }
}
