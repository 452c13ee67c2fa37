//! Signup pipeline: validation, duplicate username check, duplicate
//! email check, account creation. Each stage returns a `Result` and
//! the handler only moves on when the previous stage returned `Ok`.
//!
//! The duplicate checks and the insert are separate store operations,
//! so two concurrent signups with the same username or email can both
//! pass the checks. The UNIQUE columns reject the second insert and it
//! surfaces as a store error (500), not as a duplicate message.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use super::error::ApiError;
use super::types::*;
use super::validation::validate_signup;
use crate::db::{DbError, User, UserRepo};
use crate::server::AppState;

pub const USERNAME_TAKEN: &str = "username already registered";
pub const EMAIL_TAKEN: &str = "e-mail already registered";

pub async fn check_duplicate_username<R>(db: &R, signup: &ValidSignup) -> Result<(), ApiError>
where
    R: UserRepo + ?Sized,
{
    match db.get_user(&signup.username).await {
        Ok(_) => {
            warn!(username = %signup.username, "signup rejected: username taken");
            Err(ApiError::Duplicate(USERNAME_TAKEN))
        }
        Err(DbError::NotFound(_)) => Ok(()),
        Err(e) => Err(ApiError::Store(e)),
    }
}

pub async fn check_duplicate_email<R>(db: &R, signup: &ValidSignup) -> Result<(), ApiError>
where
    R: UserRepo + ?Sized,
{
    match db.get_user_by_email(&signup.email).await {
        Ok(_) => {
            warn!(email = %signup.email, "signup rejected: e-mail taken");
            Err(ApiError::Duplicate(EMAIL_TAKEN))
        }
        Err(DbError::NotFound(_)) => Ok(()),
        Err(e) => Err(ApiError::Store(e)),
    }
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn create_account<R>(db: &R, signup: ValidSignup, bcrypt_cost: u32) -> Result<User, ApiError>
where
    R: UserRepo + ?Sized,
{
    let password = hash_password(signup.password, bcrypt_cost).await?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: signup.username,
        email: signup.email,
        password,
        birth_date: signup.birth_date,
        gender: signup.gender,
        genres: signup.genres,
        profile_picture_path: signup.profile_picture_path,
        biography: signup.biography,
        favorites: signup.favorites,
        created: Some(chrono::Utc::now()),
    };
    db.create_user(&user).await?;

    Ok(user)
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountInfo>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let signup = validate_signup(payload).map_err(ApiError::Validation)?;
    check_duplicate_username(&*state.db, &signup).await?;
    check_duplicate_email(&*state.db, &signup).await?;
    let user = create_account(&*state.db, signup, state.config.auth.bcrypt_cost).await?;

    info!(userid = %user.id, username = %user.username, "account created");

    Ok((StatusCode::CREATED, Json(AccountInfo::from(&user))))
}
