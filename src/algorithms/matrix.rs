use std::collections::HashMap;

use ndarray::{Array2, ArrayView1};

use crate::models::{Movie, Rating};

/// Dense user-by-movie rating matrix. A cell value of 0.0 means "unrated";
/// an explicit rating of zero is indistinguishable from absence, and every
/// consumer treats 0.0 as unrated.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    user_ids: Vec<i64>,
    movie_ids: Vec<i64>,
    user_index: HashMap<i64, usize>,
    movie_index: HashMap<i64, usize>,
    values: Array2<f32>,
}

impl RatingMatrix {
    /// Builds the matrix from a full snapshot. Rows cover every user that
    /// appears in the rating records, columns cover the whole movie catalog,
    /// both in ascending id order so lookups stay stable for the lifetime of
    /// the engine. Ratings referencing movies outside the catalog are
    /// skipped; for duplicate (user, movie) pairs the last record wins.
    pub fn build(ratings: &[Rating], movies: &[Movie]) -> Self {
        let mut user_ids: Vec<i64> = ratings.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut movie_ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        movie_ids.sort_unstable();
        movie_ids.dedup();

        let user_index: HashMap<i64, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();
        let movie_index: HashMap<i64, usize> = movie_ids
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        let mut values = Array2::zeros((user_ids.len(), movie_ids.len()));
        for rating in ratings {
            let Some(&movie_pos) = movie_index.get(&rating.movie_id) else {
                continue;
            };
            let user_pos = user_index[&rating.user_id];
            values[[user_pos, movie_pos]] = rating.rating;
        }

        Self {
            user_ids,
            movie_ids,
            user_index,
            movie_index,
            values,
        }
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_movies(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn user_ids(&self) -> &[i64] {
        &self.user_ids
    }

    pub fn movie_ids(&self) -> &[i64] {
        &self.movie_ids
    }

    pub fn user_position(&self, user_id: i64) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn movie_position(&self, movie_id: i64) -> Option<usize> {
        self.movie_index.get(&movie_id).copied()
    }

    pub fn user_row(&self, position: usize) -> ArrayView1<'_, f32> {
        self.values.row(position)
    }

    pub fn movie_column(&self, position: usize) -> ArrayView1<'_, f32> {
        self.values.column(position)
    }

    pub fn value(&self, user_position: usize, movie_position: usize) -> f32 {
        self.values[[user_position, movie_position]]
    }
}
