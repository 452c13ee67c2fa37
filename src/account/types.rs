use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Favorites, Movie, User};

/// The authenticated (or path-resolved) user a request operates on.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The movie a favorites update refers to.
#[derive(Debug, Clone)]
pub struct CurrentMovie(pub Movie);

/// Signup body as received. Fields stay as raw JSON so that validation
/// can report wrong types per field instead of rejecting the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
    #[serde(default)]
    pub birth_date: Option<Value>,
    #[serde(default)]
    pub gender: Option<Value>,
    #[serde(default)]
    pub genres: Option<Value>,
    #[serde(default)]
    pub favorites: Option<Value>,
    #[serde(default)]
    pub profile_picture_path: Option<Value>,
    #[serde(default)]
    pub biography: Option<Value>,
}

/// A signup that passed validation.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub genres: Vec<String>,
    pub favorites: Favorites,
    pub profile_picture_path: Option<String>,
    pub biography: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResult {
    pub access_token: String,
    pub user: AccountInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBioRequest {
    pub biography: String,
}

/// Private view of an account, returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub genres: Vec<String>,
    pub profile_picture_path: Option<String>,
    pub biography: Option<String>,
    pub favorites: Favorites,
}

impl From<&User> for AccountInfo {
    fn from(user: &User) -> Self {
        AccountInfo {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            birth_date: user.birth_date,
            gender: user.gender.clone(),
            genres: user.genres.clone(),
            profile_picture_path: user.profile_picture_path.clone(),
            biography: user.biography.clone(),
            favorites: user.favorites.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub thumbnail: Option<String>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        MovieSummary {
            id: movie.id.clone(),
            title: movie.title.clone(),
            year: movie.year,
            thumbnail: movie.thumbnail.clone(),
        }
    }
}

/// What other users get to see. Favorites are populated, one entry
/// per slot, null where the slot is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: String,
    pub username: String,
    pub gender: String,
    pub genres: Vec<String>,
    pub profile_picture_path: Option<String>,
    pub biography: Option<String>,
    pub favorites: Vec<Option<MovieSummary>>,
}
