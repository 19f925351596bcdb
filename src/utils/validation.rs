use crate::error::AppError;
use crate::models::{NewMovie, NewUser};

pub fn validate_result_count(n: usize, max: usize) -> Result<(), AppError> {
    if n == 0 {
        return Err(AppError::InvalidArgument(
            "result count must be greater than 0".to_string(),
        ));
    }

    if n > max {
        return Err(AppError::InvalidArgument(format!(
            "result count too large (max {})",
            max
        )));
    }

    Ok(())
}

pub fn validate_rating_value(rating: f32) -> Result<(), AppError> {
    if !rating.is_finite() {
        return Err(AppError::InvalidArgument(
            "rating must be a finite number".to_string(),
        ));
    }

    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::InvalidArgument(
            "rating must be between 0.0 and 5.0".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), AppError> {
    if user.username.len() < 3 || user.username.len() > 50 {
        return Err(AppError::InvalidArgument(
            "username must be between 3 and 50 characters".to_string(),
        ));
    }

    let mut parts = user.email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::InvalidArgument(
            "email address is not valid".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_new_movie(movie: &NewMovie) -> Result<(), AppError> {
    if movie.title.is_empty() || movie.title.len() > 200 {
        return Err(AppError::InvalidArgument(
            "title must be between 1 and 200 characters".to_string(),
        ));
    }

    if movie.genre.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "genre cannot be empty".to_string(),
        ));
    }

    if movie.release_year < 1900 {
        return Err(AppError::InvalidArgument(
            "release year must be 1900 or later".to_string(),
        ));
    }

    if movie.duration < 1 {
        return Err(AppError::InvalidArgument(
            "duration must be at least 1 minute".to_string(),
        ));
    }

    if movie.description.len() < 10 {
        return Err(AppError::InvalidArgument(
            "description must be at least 10 characters".to_string(),
        ));
    }

    Ok(())
}
