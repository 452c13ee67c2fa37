use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::error::ApiError;
use super::types::*;
use crate::db::{AccessTokenRepo, DbError, Favorites, MovieRepo, User, UserRepo};
use crate::server::AppState;

pub async fn get_account_info(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<AccountInfo> {
    Json(AccountInfo::from(&user))
}

pub async fn get_public_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<PublicAccount>, ApiError> {
    Ok(Json(public_account(&*state.db, user).await?))
}

/// Builds the public projection, looking up each favorite. A slot that
/// points at a movie no longer in the store shows up as empty.
pub async fn public_account<R>(db: &R, user: User) -> Result<PublicAccount, ApiError>
where
    R: MovieRepo + ?Sized,
{
    let mut favorites = Vec::new();
    for slot in user.favorites.slots() {
        let summary = match slot {
            Some(movie_id) => match db.get_movie(movie_id).await {
                Ok(movie) => Some(MovieSummary::from(&movie)),
                Err(DbError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };
        favorites.push(summary);
    }

    Ok(PublicAccount {
        id: user.id,
        username: user.username,
        gender: user.gender,
        genres: user.genres,
        profile_picture_path: user.profile_picture_path,
        biography: user.biography,
        favorites,
    })
}

pub async fn update_bio(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    req: Result<Json<UpdateBioRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = req.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    state.db.update_biography(&user.id, &req.biography).await?;

    info!(userid = %user.id, "biography updated");
    Ok(StatusCode::NO_CONTENT)
}

/// `pos` arrives as a string; anything that is not an integer in
/// 0..4 is rejected before the store is touched.
pub async fn update_favorite(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(CurrentMovie(movie)): Extension<CurrentMovie>,
    Path((pos, _movie_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let slot: i64 = pos
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidSlot(pos.clone()))?;

    let idx = Favorites::slot_index(slot)?;
    state.db.set_favorite(&user.id, idx, &movie.id).await?;

    info!(userid = %user.id, slot = slot, movieid = %movie.id, "favorite updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_tokens_by_user(&user.id).await?;
    state.db.delete_user(&user.id).await?;

    info!(userid = %user.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
