use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

use crate::models::Movie;

/// Per-movie feature matrix used for clustering: duration and release year
/// followed by a one-hot column for every genre token observed across the
/// catalog. Rows follow ascending movie id, matching the rating matrix
/// column order.
#[derive(Debug, Clone)]
pub struct MovieFeatures {
    movie_ids: Vec<i64>,
    columns: Vec<String>,
    raw: Array2<f32>,
    standardized: Array2<f32>,
}

impl MovieFeatures {
    pub fn build(movies: &[Movie]) -> Self {
        let mut sorted: Vec<&Movie> = movies.iter().collect();
        sorted.sort_by_key(|movie| movie.id);

        let genre_tokens: BTreeSet<String> = sorted
            .iter()
            .flat_map(|movie| movie.genre_tokens())
            .collect();

        let mut columns = vec!["duration".to_string(), "release_year".to_string()];
        let genre_positions: HashMap<String, usize> = genre_tokens
            .iter()
            .enumerate()
            .map(|(offset, token)| (token.clone(), columns.len() + offset))
            .collect();
        columns.extend(genre_tokens);

        let mut raw = Array2::zeros((sorted.len(), columns.len()));
        for (row, movie) in sorted.iter().enumerate() {
            raw[[row, 0]] = movie.duration as f32;
            raw[[row, 1]] = movie.release_year as f32;
            for token in movie.genre_tokens() {
                if let Some(&column) = genre_positions.get(&token) {
                    raw[[row, column]] = 1.0;
                }
            }
        }

        let standardized = standardize(&raw);

        Self {
            movie_ids: sorted.iter().map(|movie| movie.id).collect(),
            columns,
            raw,
            standardized,
        }
    }

    pub fn movie_ids(&self) -> &[i64] {
        &self.movie_ids
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn raw(&self) -> &Array2<f32> {
        &self.raw
    }

    pub fn standardized(&self) -> &Array2<f32> {
        &self.standardized
    }
}

/// Per-column z-score transform. A zero-variance column divides by 1
/// instead of its standard deviation and comes out constant 0.
fn standardize(raw: &Array2<f32>) -> Array2<f32> {
    let (n_rows, n_columns) = raw.dim();
    let mut standardized = Array2::zeros((n_rows, n_columns));
    if n_rows == 0 {
        return standardized;
    }

    for column in 0..n_columns {
        let values = raw.column(column);
        let mean = values.sum() / n_rows as f32;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n_rows as f32;
        let std_dev = variance.sqrt();
        let divisor = if std_dev == 0.0 { 1.0 } else { std_dev };

        for row in 0..n_rows {
            standardized[[row, column]] = (raw[[row, column]] - mean) / divisor;
        }
    }

    standardized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, genre: &str, year: i32, duration: i32) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            genre: genre.to_string(),
            release_year: year,
            duration,
            description: "A test movie description".to_string(),
        }
    }

    #[test]
    fn test_genre_union_becomes_one_hot_columns() {
        let movies = vec![
            movie(1, "Drama, Crime", 1994, 142),
            movie(2, " Sci-Fi ,Drama", 2010, 148),
        ];

        let features = MovieFeatures::build(&movies);

        assert_eq!(
            features.columns(),
            &["duration", "release_year", "Crime", "Drama", "Sci-Fi"]
        );
        let raw = features.raw();
        // movie 1: Crime + Drama
        assert_eq!(raw[[0, 2]], 1.0);
        assert_eq!(raw[[0, 3]], 1.0);
        assert_eq!(raw[[0, 4]], 0.0);
        // movie 2: Drama + Sci-Fi, token whitespace trimmed
        assert_eq!(raw[[1, 2]], 0.0);
        assert_eq!(raw[[1, 3]], 1.0);
        assert_eq!(raw[[1, 4]], 1.0);
    }

    #[test]
    fn test_standardize_centers_columns() {
        let movies = vec![
            movie(1, "Drama", 2000, 100),
            movie(2, "Drama", 2010, 200),
        ];

        let features = MovieFeatures::build(&movies);
        let standardized = features.standardized();

        // duration column: mean 150, std 50
        assert!((standardized[[0, 0]] + 1.0).abs() < 1e-5);
        assert!((standardized[[1, 0]] - 1.0).abs() < 1e-5);
        // shared genre column has zero variance and stays constant 0
        let drama = features
            .columns()
            .iter()
            .position(|c| c == "Drama")
            .unwrap();
        assert_eq!(standardized[[0, drama]], 0.0);
        assert_eq!(standardized[[1, drama]], 0.0);
    }

    #[test]
    fn test_rows_follow_ascending_movie_id() {
        let movies = vec![movie(5, "Drama", 2000, 90), movie(2, "Drama", 2001, 95)];
        let features = MovieFeatures::build(&movies);
        assert_eq!(features.movie_ids(), &[2, 5]);
    }
}
