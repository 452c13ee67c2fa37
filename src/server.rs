use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::account;
use crate::config::Config;
use crate::db::SqliteRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Everything under /api/account runs as the token's owner.
    let account_routes = Router::new()
        .route(
            "/api/account",
            get(account::get_account_info).delete(account::delete_account),
        )
        .route("/api/account/public", get(account::get_public_account))
        .route("/api/account/biography", patch(account::update_bio))
        .route(
            "/api/account/favorites/:pos/:movie_id",
            patch(account::update_favorite)
                .route_layer(from_fn_with_state(state.clone(), account::resolve_movie)),
        )
        .route_layer(from_fn_with_state(state.clone(), account::require_user));

    let public_routes = Router::new()
        .route("/api/auth/signup", post(account::signup))
        .route("/api/auth/signin", post(account::signin))
        .route(
            "/api/users/:id",
            get(account::get_public_account)
                .route_layer(from_fn_with_state(state.clone(), account::resolve_user)),
        )
        .route("/api/movies/:id", get(crate::movies::get_movie));

    Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(account_routes)
        .merge(public_routes)
        .fallback(fallback_handler)
        .layer(from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::{sample_movie, test_state};
    use crate::db::{DbError, MovieRepo, UserRepo};
    use axum::body::Body;
    use axum::http::header;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn signup_body() -> Value {
        json!({
            "username": "1234",
            "email": "a@gmail.com",
            "password": "123456",
            "birthDate": "1990-05-17",
            "gender": "Male",
            "genres": ["Action", "Drama"],
            "favorites": ["", "", "", ""]
        })
    }

    async fn signed_in(app: &Router) -> (String, String) {
        let (status, created) = send(app, "POST", "/api/auth/signup", None, Some(signup_body())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, session) = send(
            app,
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "username": "1234", "password": "123456" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            session["accessToken"].as_str().unwrap().to_string(),
            created["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_signup_validation_errors() {
        let app = build_router(test_state().await);

        let mut body = signup_body();
        body["username"] = json!("123");
        body["email"] = json!("aa1234");
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            value,
            json!({ "errors": {
                "username": "username must be at least 4 characters",
                "email": "email must be a valid email"
            }})
        );
    }

    #[tokio::test]
    async fn test_signup_duplicates() {
        let state = test_state().await;
        let app = build_router(state.clone());
        let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(signup_body())).await;
        assert_eq!(status, StatusCode::CREATED);

        let mut body = signup_body();
        body["email"] = json!("bb@gmail.com");
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value, json!({ "message": "username already registered" }));

        let mut body = signup_body();
        body["username"] = json!("adddddd");
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value, json!({ "message": "e-mail already registered" }));

        // Neither rejected signup reached the insert.
        assert!(matches!(
            state.db.get_user_by_email("bb@gmail.com").await,
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(state.db.get_user("adddddd").await, Err(DbError::NotFound(_))));
        assert_eq!(state.db.get_user("1234").await.unwrap().email, "a@gmail.com");
    }

    #[tokio::test]
    async fn test_signup_wrong_types_are_field_errors() {
        let app = build_router(test_state().await);

        let mut body = signup_body();
        body["email"] = json!("bad");
        body["genres"] = json!("Action");
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            value,
            json!({ "errors": {
                "email": "email must be a valid email",
                "genres": "genres must be a `array` type"
            }})
        );

        let mut body = signup_body();
        body["username"] = json!(12345);
        body["birthDate"] = json!(1590969600000i64);
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value["username"], "12345");
        assert_eq!(value["birthDate"], "2020-06-01");
    }

    #[tokio::test]
    async fn test_signup_rejects_non_object_body() {
        let app = build_router(test_state().await);
        let (status, value) = send(&app, "POST", "/api/auth/signup", None, Some(json!("signup"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["message"].is_string());
    }

    #[tokio::test]
    async fn test_signin_uses_username_as_registered() {
        let app = build_router(test_state().await);
        let mut body = signup_body();
        body["username"] = json!(" abcd");
        let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let signin = |username: &str| json!({ "username": username, "password": "123456" });
        let (status, _) = send(&app, "POST", "/api/auth/signin", None, Some(signin(" abcd"))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", "/api/auth/signin", None, Some(signin("abcd"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_account_requires_token() {
        let app = build_router(test_state().await);
        let (status, _) = send(&app, "GET", "/api/account", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, "GET", "/api/account", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let app = build_router(test_state().await);
        signed_in(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "username": "1234", "password": "wrong!" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_account_flow() {
        let state = test_state().await;
        state.db.upsert_movie(&sample_movie("m1")).await.unwrap();
        let app = build_router(state);
        let (token, user_id) = signed_in(&app).await;

        let (status, info) = send(&app, "GET", "/api/account", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["id"], user_id.as_str());
        assert_eq!(info["favorites"], json!([null, null, null, null]));

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/account/biography",
            Some(&token),
            Some(json!({ "biography": "abc123" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&app, "PATCH", "/api/account/favorites/2/m1", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&app, "PATCH", "/api/account/favorites/4/m1", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, "PATCH", "/api/account/favorites/1/nope", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, info) = send(&app, "GET", "/api/account", Some(&token), None).await;
        assert_eq!(info["biography"], "abc123");
        assert_eq!(info["favorites"], json!([null, null, "m1", null]));

        let (status, public) =
            send(&app, "GET", &format!("/api/users/{}", user_id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(public.get("email").is_none());
        assert_eq!(public["favorites"][2]["id"], "m1");
        assert_eq!(public["favorites"][0], Value::Null);

        let (status, _) = send(&app, "GET", "/api/users/unknown", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/api/account", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/api/account", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
