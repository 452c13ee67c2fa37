use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::account::ApiError;
use crate::db::{DbError, Movie, MovieRepo};
use crate::server::AppState;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read movie file {0}: {1}")]
    Read(String, std::io::Error),
    #[error("Failed to parse movie file {0}: {1}")]
    Parse(String, serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbError),
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    match state.db.get_movie(&id).await {
        Ok(movie) => Ok(Json(movie)),
        Err(DbError::NotFound(_)) => Err(ApiError::NotFound(format!("movie {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

/// Load a JSON array of movies into the store, replacing movies that
/// share an id. Returns the number of movies written.
pub async fn load_movies<R>(db: &R, path: &str) -> Result<usize, SeedError>
where
    R: MovieRepo + ?Sized,
{
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Read(path.to_string(), e))?;
    let movies = parse_movies(&content).map_err(|e| SeedError::Parse(path.to_string(), e))?;

    for movie in &movies {
        db.upsert_movie(movie).await?;
    }

    info!(count = movies.len(), file = path, "movies loaded");
    Ok(movies.len())
}

fn parse_movies(content: &str) -> Result<Vec<Movie>, serde_json::Error> {
    serde_json::from_str(content)
}
