use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use std::collections::HashMap;
use tracing::{debug, info};

use super::error::ApiError;
use super::types::*;
use crate::db::{AccessToken, AccessTokenRepo, DbError, MovieRepo, UserRepo};
use crate::server::AppState;

pub async fn signin(
    State(state): State<AppState>,
    req: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResult>, ApiError> {
    let Json(req) = req.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let username = req.username.as_str();

    let user = match state.db.get_user(username).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(e.into()),
    };

    let hash = user.password.clone();
    let password_ok = tokio::task::spawn_blocking(move || bcrypt::verify(req.password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .unwrap_or(false);
    if !password_ok {
        debug!(username = %username, "sign-in rejected: bad password");
        return Err(ApiError::Unauthorized);
    }

    let token = AccessToken {
        token: uuid::Uuid::new_v4().to_string(),
        userid: user.id.clone(),
        created: Some(chrono::Utc::now()),
    };
    state.db.upsert_token(&token).await?;

    info!(userid = %user.id, "signed in");

    Ok(Json(SignInResult {
        access_token: token.token,
        user: AccountInfo::from(&user),
    }))
}

/// Resolves the bearer token to a user and attaches it as `CurrentUser`.
pub async fn require_user(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token_str = extract_token(&req, &params).ok_or(ApiError::Unauthorized)?;

    let token = match state.db.get_token(&token_str).await {
        Ok(token) => token,
        Err(DbError::NotFound(_)) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(e.into()),
    };
    let user = match state.db.get_user_by_id(&token.userid).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Attaches the user named by the `:id` path segment as `CurrentUser`.
pub async fn resolve_user(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = params
        .get("id")
        .ok_or_else(|| ApiError::BadRequest("missing user id".to_string()))?;
    let user = match state.db.get_user_by_id(id).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(ApiError::NotFound(format!("user {} not found", id))),
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Attaches the movie named by the `:movie_id` path segment as `CurrentMovie`.
pub async fn resolve_movie(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = params
        .get("movie_id")
        .ok_or_else(|| ApiError::BadRequest("missing movie id".to_string()))?;
    let movie = match state.db.get_movie(id).await {
        Ok(movie) => movie,
        Err(DbError::NotFound(_)) => return Err(ApiError::NotFound(format!("movie {} not found", id))),
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(CurrentMovie(movie));
    Ok(next.run(req).await)
}

fn extract_token<B>(req: &axum::http::Request<B>, params: &HashMap<String, String>) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_bearer)
    {
        return Some(token);
    }

    if let Some(token) = req
        .headers()
        .get("X-Access-Token")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        return Some(token);
    }

    params.get("api_key").cloned()
}

fn parse_bearer(auth_str: &str) -> Option<String> {
    let (scheme, token) = auth_str.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
