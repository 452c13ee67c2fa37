use chrono::{NaiveDate, Utc};
use serde_json::json;

use super::types::SignupPayload;
use crate::config::{AuthConfig, Config};
use crate::db::{Favorites, Movie, SqliteRepository, User};
use crate::server::AppState;
use std::sync::Arc;

pub fn valid_payload() -> SignupPayload {
    SignupPayload {
        username: Some(json!("1234")),
        email: Some(json!("a@gmail.com")),
        password: Some(json!("123456")),
        birth_date: Some(json!("1990-05-17")),
        gender: Some(json!("Male")),
        genres: Some(json!(["Action", "Drama"])),
        favorites: Some(json!(["", "", "", ""])),
        profile_picture_path: None,
        biography: None,
    }
}

pub fn sample_user(username: &str, email: &str) -> User {
    User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password: "not-a-real-hash".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        gender: "Male".to_string(),
        genres: vec!["Action".to_string(), "Drama".to_string()],
        profile_picture_path: None,
        biography: None,
        favorites: Favorites::default(),
        created: Some(Utc::now()),
    }
}

pub fn sample_movie(id: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: "Timmy Failure: Mistakes Were Made".to_string(),
        year: 2020,
        cast: vec![
            "Winslow Fegley".to_string(),
            "Ophelia Lovibond".to_string(),
            "Craig Robinson".to_string(),
            "Wallace Shawn".to_string(),
        ],
        genres: vec!["Adventure".to_string(), "Comedy".to_string(), "Family".to_string()],
        extract: Some("A 2020 American adventure comedy film.".to_string()),
        thumbnail: Some("https://example.org/timmy.jpeg".to_string()),
    }
}

/// App state over a fresh in-memory store, with the cheapest bcrypt cost.
pub async fn test_state() -> AppState {
    let config = Config {
        auth: AuthConfig { bcrypt_cost: 4 },
        ..Default::default()
    };
    let db = Arc::new(SqliteRepository::in_memory().await.unwrap());
    AppState::new(config, db)
}
